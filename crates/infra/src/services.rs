//! Manual wiring of the promotions and products services.

use std::sync::Arc;

use bazaar_auth::{AuthorizationPolicy, UserDirectory};
use bazaar_core::{Clock, RepositoryResult};
use bazaar_inventory::{ProductRepository, ProductsService};
use bazaar_promotions::{PromotionRepository, PromotionsService};

use crate::config::InfraConfig;
use crate::memory::{InMemoryProductRepository, InMemoryPromotionRepository, InMemoryUserDirectory};
use crate::postgres::{
    self, PostgresProductRepository, PostgresPromotionRepository, PostgresUserDirectory,
};

/// Both services, sharing one policy, clock and pagination config.
pub struct Services<P, I, D, C> {
    pub promotions: PromotionsService<P, D, C>,
    pub products: ProductsService<I, C>,
}

impl<P, I, D, C> Services<P, I, D, C>
where
    P: PromotionRepository,
    I: ProductRepository,
    D: UserDirectory,
    C: Clock + Clone,
{
    pub fn new(
        config: &InfraConfig,
        policy: AuthorizationPolicy,
        promotions: P,
        products: I,
        directory: D,
        clock: C,
    ) -> Self {
        let pagination = config.pagination();
        Self {
            promotions: PromotionsService::new(
                policy.clone(),
                promotions,
                directory,
                clock.clone(),
                pagination,
            ),
            products: ProductsService::new(policy, products, clock, pagination),
        }
    }
}

/// In-memory stores, kept reachable so tests and dev tooling can seed them.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStores {
    pub promotions: Arc<InMemoryPromotionRepository>,
    pub products: Arc<InMemoryProductRepository>,
    pub users: Arc<InMemoryUserDirectory>,
}

pub type InMemoryServices<C> = Services<
    Arc<InMemoryPromotionRepository>,
    Arc<InMemoryProductRepository>,
    Arc<InMemoryUserDirectory>,
    C,
>;

impl InMemoryStores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn services<C: Clock + Clone>(
        &self,
        config: &InfraConfig,
        clock: C,
    ) -> InMemoryServices<C> {
        Services::new(
            config,
            AuthorizationPolicy::default(),
            self.promotions.clone(),
            self.products.clone(),
            self.users.clone(),
            clock,
        )
    }
}

pub type PostgresServices<C> =
    Services<PostgresPromotionRepository, PostgresProductRepository, PostgresUserDirectory, C>;

/// Connect, apply the schema and wire Postgres-backed services.
pub async fn postgres_services<C: Clock + Clone>(
    config: &InfraConfig,
    clock: C,
) -> RepositoryResult<PostgresServices<C>> {
    let pool = postgres::connect(config).await?;
    postgres::apply_schema(&pool).await?;
    Ok(Services::new(
        config,
        AuthorizationPolicy::default(),
        PostgresPromotionRepository::new(pool.clone()),
        PostgresProductRepository::new(pool.clone()),
        PostgresUserDirectory::new(pool),
        clock,
    ))
}
