use serde::{Deserialize, Serialize};

use bazaar_auth::{Action, AuthorizationPolicy, Principal, ResourceClass};
use bazaar_core::{
    Clock, DomainError, DomainResult, PageRequest, PaginatedResult, PaginationConfig, ProductId,
    SortRequest,
};

use crate::{
    InventoryLedger, NewProduct, Product, ProductFilter, ProductPatch, ProductRepository,
    StockReport,
};

/// Query-string shaped list request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    #[serde(flatten)]
    pub filter: ProductFilter,
    #[serde(flatten)]
    pub sort: SortRequest,
    #[serde(flatten)]
    pub page: PageRequest,
}

/// Entry point for warehouse operations; authorizes before anything else.
pub struct ProductsService<R, C> {
    policy: AuthorizationPolicy,
    ledger: InventoryLedger<R, C>,
}

impl<R, C> ProductsService<R, C>
where
    R: ProductRepository,
    C: Clock,
{
    pub fn new(
        policy: AuthorizationPolicy,
        repository: R,
        clock: C,
        pagination: PaginationConfig,
    ) -> Self {
        Self {
            policy,
            ledger: InventoryLedger::new(repository, clock, pagination),
        }
    }

    fn authorize<'p>(
        &self,
        principal: Option<&'p Principal>,
        action: Action,
    ) -> DomainResult<&'p Principal> {
        self.policy
            .authorize(principal, action, ResourceClass::Product)?;
        principal.ok_or(DomainError::Unauthorized)
    }

    pub async fn create_product(
        &self,
        principal: Option<&Principal>,
        dto: NewProduct,
    ) -> DomainResult<Product> {
        let actor = self.authorize(principal, Action::Create)?;
        self.ledger.create(dto, actor.id).await
    }

    pub async fn get_product(
        &self,
        principal: Option<&Principal>,
        id: i64,
    ) -> DomainResult<Product> {
        self.authorize(principal, Action::Read)?;
        self.ledger.get(ProductId::try_from(id)?).await
    }

    pub async fn get_product_status(
        &self,
        principal: Option<&Principal>,
        id: i64,
    ) -> DomainResult<StockReport> {
        self.authorize(principal, Action::Read)?;
        self.ledger.get_status(ProductId::try_from(id)?).await
    }

    pub async fn add_product_quantity(
        &self,
        principal: Option<&Principal>,
        id: i64,
        quantity: i64,
    ) -> DomainResult<Product> {
        let actor = self.authorize(principal, Action::AddQuantity)?;
        self.ledger
            .add_quantity(ProductId::try_from(id)?, quantity, actor.id)
            .await
    }

    pub async fn purchase_product(
        &self,
        principal: Option<&Principal>,
        id: i64,
        quantity: i64,
    ) -> DomainResult<Product> {
        let actor = self.authorize(principal, Action::Purchase)?;
        self.ledger
            .purchase(ProductId::try_from(id)?, quantity, actor.id)
            .await
    }

    pub async fn update_product(
        &self,
        principal: Option<&Principal>,
        id: i64,
        patch: ProductPatch,
    ) -> DomainResult<Product> {
        let actor = self.authorize(principal, Action::Update)?;
        self.ledger
            .update_fields(ProductId::try_from(id)?, patch, actor.id)
            .await
    }

    pub async fn delete_product(&self, principal: Option<&Principal>, id: i64) -> DomainResult<()> {
        self.authorize(principal, Action::Delete)?;
        self.ledger.delete(ProductId::try_from(id)?).await
    }

    pub async fn list_products(
        &self,
        principal: Option<&Principal>,
        query: ProductListQuery,
    ) -> DomainResult<PaginatedResult<Product>> {
        self.authorize(principal, Action::ListAll)?;
        self.ledger
            .list(query.filter, Some(&query.sort), query.page)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use bazaar_auth::Role;
    use bazaar_core::{ErrorKind, FixedClock, Reason, UserId};
    use chrono::{TimeZone, Utc};

    use crate::MockProductRepository;

    fn untouched_repository() -> MockProductRepository {
        let mut repository = MockProductRepository::new();
        repository.expect_create().never();
        repository.expect_find_by_id().never();
        repository.expect_find_many().never();
        repository.expect_update().never();
        repository.expect_delete().never();
        repository.expect_increment_quantity().never();
        repository.expect_decrement_quantity_if_available().never();
        repository
    }

    fn service(
        repository: MockProductRepository,
    ) -> ProductsService<MockProductRepository, FixedClock> {
        ProductsService::new(
            AuthorizationPolicy::default(),
            repository,
            FixedClock::new(Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap()),
            PaginationConfig::default(),
        )
    }

    fn principal(role: Role) -> Principal {
        Principal::new(UserId::new(10), "staff@example.com", role)
    }

    fn rice() -> NewProduct {
        NewProduct {
            name: "Rice".into(),
            description: None,
            price: 2.0,
            quantity: 1,
            category: None,
            sku: None,
        }
    }

    #[tokio::test]
    async fn anonymous_purchase_never_reaches_storage() {
        let service = service(untouched_repository());
        let err = service.purchase_product(None, 1, 1).await.unwrap_err();
        assert_eq!(err, DomainError::Unauthorized);
        assert_eq!(err.kind().status_code(), 401);
    }

    #[tokio::test]
    async fn role_matrix_is_enforced_before_storage() {
        let service = service(untouched_repository());
        let manager = principal(Role::WarehouseManager);
        let supplier = principal(Role::Supplier);

        let denied = [
            service.purchase_product(Some(&manager), 1, 1).await,
            service.create_product(Some(&manager), rice()).await,
            service.add_product_quantity(Some(&supplier), 1, 1).await,
            service
                .update_product(Some(&supplier), 1, ProductPatch::default())
                .await,
        ];
        for outcome in denied {
            assert_eq!(outcome.unwrap_err().kind(), ErrorKind::Forbidden);
        }
        assert_eq!(
            service
                .delete_product(Some(&supplier), 1)
                .await
                .unwrap_err()
                .kind(),
            ErrorKind::Forbidden
        );
    }

    #[tokio::test]
    async fn admin_cannot_add_stock() {
        let service = service(untouched_repository());
        let admin = principal(Role::SuperAdmin);
        let err = service
            .add_product_quantity(Some(&admin), 1, 5)
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Reason::Forbidden);
    }

    #[tokio::test]
    async fn invalid_ids_and_quantities_fail_before_storage() {
        let service = service(untouched_repository());
        let manager = principal(Role::WarehouseManager);
        let admin = principal(Role::Admin);

        let err = service
            .add_product_quantity(Some(&manager), 0, 5)
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Reason::InvalidId);

        let err = service
            .add_product_quantity(Some(&manager), 3, 0)
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Reason::InvalidQuantity);

        let err = service
            .get_product_status(Some(&admin), -1)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn every_role_may_read_status() {
        let mut repository = MockProductRepository::new();
        repository.expect_find_by_id().times(Role::ALL.len()).returning(|_| Ok(None));
        let service = service(repository);

        for role in Role::ALL {
            let err = service
                .get_product_status(Some(&principal(role)), 8)
                .await
                .unwrap_err();
            assert_eq!(err.reason(), Reason::ProductNotFound);
        }
    }

    #[tokio::test]
    async fn creator_is_the_acting_principal() {
        let mut repository = MockProductRepository::new();
        repository
            .expect_create()
            .withf(|draft| draft.created_by_id == UserId::new(10) && draft.is_active)
            .times(1)
            .returning(|draft| {
                Ok(Product {
                    id: ProductId::new(1),
                    name: draft.name,
                    description: draft.description,
                    price: draft.price,
                    quantity: draft.quantity,
                    category: draft.category,
                    sku: draft.sku,
                    is_active: draft.is_active,
                    created_by_id: draft.created_by_id,
                    updated_by_id: None,
                    created_at: draft.created_at,
                    updated_at: draft.created_at,
                })
            });
        let service = service(repository);

        let created = service
            .create_product(Some(&principal(Role::Admin)), rice())
            .await
            .unwrap();
        assert_eq!(created.created_by_id, UserId::new(10));
    }
}
