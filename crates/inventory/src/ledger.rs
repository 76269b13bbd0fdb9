//! Product stock rules: creation, quantity movements, derived availability.

use tracing::{debug, info, warn};

use bazaar_core::{
    Clock, DomainError, DomainResult, PageRequest, PaginatedResult, PaginationConfig,
    PaginationFilter, ProductId, Reason, SortRequest, SortWhitelist, UserId, ValidationPipeline,
    validation::{
        is_non_blank, is_non_empty_payload, is_non_negative_integer, is_non_negative_number,
        is_positive_integer,
    },
};

use crate::{
    Decrement, NewProduct, Product, ProductChanges, ProductDraft, ProductFilter, ProductPatch,
    ProductRepository, ProductSortField, StockMovement, StockReport,
};

fn creation_rules() -> ValidationPipeline<NewProduct> {
    ValidationPipeline::new()
        .rule(
            "name",
            Reason::ValidationFailed,
            "name is required",
            |p: &NewProduct| is_non_blank(&p.name),
        )
        .rule(
            "price",
            Reason::ValidationFailed,
            "price must be a non-negative number",
            |p: &NewProduct| is_non_negative_number(p.price),
        )
        .rule(
            "quantity",
            Reason::ValidationFailed,
            "quantity must be a non-negative integer",
            |p: &NewProduct| is_non_negative_integer(p.quantity),
        )
        .rule(
            "sku",
            Reason::ValidationFailed,
            "sku must not be blank",
            |p: &NewProduct| p.sku.as_deref().is_none_or(is_non_blank),
        )
}

fn patch_rules() -> ValidationPipeline<ProductPatch> {
    ValidationPipeline::new()
        .rule(
            "body",
            Reason::ValidationFailed,
            "at least one field must be supplied",
            |p: &ProductPatch| is_non_empty_payload(p),
        )
        .rule(
            "name",
            Reason::ValidationFailed,
            "name must not be blank",
            |p: &ProductPatch| p.name.as_deref().is_none_or(is_non_blank),
        )
        .rule(
            "price",
            Reason::ValidationFailed,
            "price must be a non-negative number",
            |p: &ProductPatch| p.price.is_none_or(is_non_negative_number),
        )
        .rule(
            "quantity",
            Reason::ValidationFailed,
            "quantity must be a non-negative integer",
            |p: &ProductPatch| p.quantity.is_none_or(is_non_negative_integer),
        )
}

fn filter_rules() -> ValidationPipeline<ProductFilter> {
    ValidationPipeline::new()
        .rule(
            "minPrice",
            Reason::ValidationFailed,
            "minPrice must be a finite number",
            |f: &ProductFilter| f.min_price.is_none_or(f64::is_finite),
        )
        .rule(
            "maxPrice",
            Reason::ValidationFailed,
            "maxPrice must be a finite number",
            |f: &ProductFilter| f.max_price.is_none_or(f64::is_finite),
        )
}

/// Validate a requested stock movement.
pub fn stock_delta(delta: i64) -> DomainResult<u64> {
    if !is_positive_integer(delta) {
        return Err(DomainError::invalid_input(
            Reason::InvalidQuantity,
            format!("quantity must be a positive integer, got {delta}"),
        ));
    }
    Ok(delta.unsigned_abs())
}

pub fn product_pagination(config: PaginationConfig) -> PaginationFilter<ProductSortField> {
    PaginationFilter::new(
        SortWhitelist::new(ProductSortField::ALL, ProductSortField::DEFAULT_ORDER),
        config,
    )
}

pub struct InventoryLedger<R, C> {
    repository: R,
    clock: C,
    pagination: PaginationFilter<ProductSortField>,
    creation_rules: ValidationPipeline<NewProduct>,
    patch_rules: ValidationPipeline<ProductPatch>,
    filter_rules: ValidationPipeline<ProductFilter>,
}

impl<R, C> InventoryLedger<R, C>
where
    R: ProductRepository,
    C: Clock,
{
    pub fn new(repository: R, clock: C, pagination: PaginationConfig) -> Self {
        Self {
            repository,
            clock,
            pagination: product_pagination(pagination),
            creation_rules: creation_rules(),
            patch_rules: patch_rules(),
            filter_rules: filter_rules(),
        }
    }

    pub async fn create(&self, dto: NewProduct, creator: UserId) -> DomainResult<Product> {
        let now = self.clock.now();
        self.creation_rules.validate(&dto, now)?;

        let draft = ProductDraft {
            name: dto.name,
            description: dto.description,
            price: dto.price,
            quantity: dto.quantity.unsigned_abs(),
            category: dto.category,
            sku: dto.sku,
            is_active: true,
            created_by_id: creator,
            created_at: now,
        };
        let product = self
            .repository
            .create(draft)
            .await
            .map_err(|e| e.into_domain(Reason::ProductNotFound))?;

        info!(
            product_id = %product.id,
            creator_id = %creator,
            quantity = product.quantity,
            "product created"
        );
        Ok(product)
    }

    pub async fn get(&self, id: ProductId) -> DomainResult<Product> {
        debug!(product_id = %id, "loading product");
        self.repository
            .find_by_id(id)
            .await
            .map_err(|e| e.into_domain(Reason::ProductNotFound))?
            .ok_or(DomainError::not_found(Reason::ProductNotFound))
    }

    /// Receive stock. Never decreases the quantity.
    pub async fn add_quantity(
        &self,
        id: ProductId,
        delta: i64,
        actor: UserId,
    ) -> DomainResult<Product> {
        let amount = stock_delta(delta)?;
        let movement = StockMovement {
            amount,
            actor,
            at: self.clock.now(),
        };

        let product = self
            .repository
            .increment_quantity(id, movement)
            .await
            .map_err(|e| e.into_domain(Reason::ProductNotFound))?;

        info!(product_id = %id, added = amount, quantity = product.quantity, "stock received");
        Ok(product)
    }

    /// Take stock out. Over-purchase is rejected and leaves the product as is.
    pub async fn purchase(
        &self,
        id: ProductId,
        delta: i64,
        actor: UserId,
    ) -> DomainResult<Product> {
        let amount = stock_delta(delta)?;
        let movement = StockMovement {
            amount,
            actor,
            at: self.clock.now(),
        };

        let outcome = self
            .repository
            .decrement_quantity_if_available(id, movement)
            .await
            .map_err(|e| e.into_domain(Reason::ProductNotFound))?;

        match outcome {
            Decrement::Applied(product) => {
                info!(
                    product_id = %id,
                    purchased = amount,
                    quantity = product.quantity,
                    "stock purchased"
                );
                Ok(product)
            }
            Decrement::Insufficient { available } => {
                warn!(product_id = %id, requested = amount, available, "insufficient stock");
                Err(DomainError::conflict(
                    Reason::InsufficientStock,
                    format!("requested {amount}, only {available} available"),
                ))
            }
        }
    }

    pub async fn update_fields(
        &self,
        id: ProductId,
        patch: ProductPatch,
        actor: UserId,
    ) -> DomainResult<Product> {
        let now = self.clock.now();
        self.patch_rules.validate(&patch, now)?;

        let product = self
            .repository
            .update(id, ProductChanges::from_patch(patch, actor, now))
            .await
            .map_err(|e| e.into_domain(Reason::ProductNotFound))?;

        info!(product_id = %id, actor_id = %actor, "product updated");
        Ok(product)
    }

    /// Hard delete; there is no activity window for products.
    pub async fn delete(&self, id: ProductId) -> DomainResult<()> {
        self.repository
            .delete(id)
            .await
            .map_err(|e| e.into_domain(Reason::ProductNotFound))?;
        info!(product_id = %id, "product deleted");
        Ok(())
    }

    pub async fn get_status(&self, id: ProductId) -> DomainResult<StockReport> {
        let product = self.get(id).await?;
        Ok(StockReport::from(&product))
    }

    pub async fn list(
        &self,
        filter: ProductFilter,
        sort: Option<&SortRequest>,
        page: PageRequest,
    ) -> DomainResult<PaginatedResult<Product>> {
        self.filter_rules.validate(&filter, self.clock.now())?;
        let order = self.pagination.resolve_sort(sort)?;
        let window = self.pagination.paginate(page);
        let filter = ProductFilter {
            name: filter.name.filter(|n| !n.trim().is_empty()),
            ..filter
        };

        let found = self
            .repository
            .find_many(filter, order, window)
            .await
            .map_err(|e| e.into_domain(Reason::ProductNotFound))?;

        debug!(total = found.total, page = window.page, "products listed");
        Ok(PaginatedResult::new(found.items, found.total, window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use bazaar_core::{
        ErrorKind, FixedClock, OrderBy, Page, Pagination, RepositoryError, RepositoryResult,
        SortDirection,
    };
    use chrono::{DateTime, TimeZone, Utc};
    use tokio::sync::Mutex;

    use crate::{MockProductRepository, sort_products};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 9, 30, 0).unwrap()
    }

    const ADMIN: UserId = UserId::new(1);
    const MANAGER: UserId = UserId::new(4);

    #[derive(Default)]
    struct Store {
        rows: Mutex<Vec<Product>>,
    }

    #[async_trait]
    impl ProductRepository for Store {
        async fn create(&self, draft: ProductDraft) -> RepositoryResult<Product> {
            let mut rows = self.rows.lock().await;
            if draft.sku.is_some() && rows.iter().any(|p| p.sku == draft.sku) {
                return Err(RepositoryError::Conflict("duplicate sku".into()));
            }
            let product = Product {
                id: ProductId::new(rows.len() as u64 + 1),
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
            };
            rows.push(product.clone());
            Ok(product)
        }

        async fn find_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
            Ok(self.rows.lock().await.iter().find(|p| p.id == id).cloned())
        }

        async fn find_many(
            &self,
            filter: ProductFilter,
            order: OrderBy<ProductSortField>,
            window: Pagination,
        ) -> RepositoryResult<Page<Product>> {
            let mut items: Vec<Product> = self
                .rows
                .lock()
                .await
                .iter()
                .filter(|p| filter.matches(p))
                .cloned()
                .collect();
            sort_products(&mut items, order);
            let total = items.len() as u64;
            Ok(Page {
                items: window.window(items),
                total,
            })
        }

        async fn update(
            &self,
            id: ProductId,
            changes: ProductChanges,
        ) -> RepositoryResult<Product> {
            let mut rows = self.rows.lock().await;
            let row = rows
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(RepositoryError::NotFound)?;
            changes.apply(row);
            Ok(row.clone())
        }

        async fn delete(&self, id: ProductId) -> RepositoryResult<()> {
            let mut rows = self.rows.lock().await;
            let before = rows.len();
            rows.retain(|p| p.id != id);
            if rows.len() == before {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        }

        async fn increment_quantity(
            &self,
            id: ProductId,
            movement: StockMovement,
        ) -> RepositoryResult<Product> {
            let mut rows = self.rows.lock().await;
            let row = rows
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(RepositoryError::NotFound)?;
            row.quantity += movement.amount;
            row.updated_by_id = Some(movement.actor);
            row.updated_at = movement.at;
            Ok(row.clone())
        }

        async fn decrement_quantity_if_available(
            &self,
            id: ProductId,
            movement: StockMovement,
        ) -> RepositoryResult<Decrement> {
            let mut rows = self.rows.lock().await;
            let row = rows
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(RepositoryError::NotFound)?;
            if row.quantity < movement.amount {
                return Ok(Decrement::Insufficient {
                    available: row.quantity,
                });
            }
            row.quantity -= movement.amount;
            row.updated_by_id = Some(movement.actor);
            row.updated_at = movement.at;
            Ok(Decrement::Applied(row.clone()))
        }
    }

    fn ledger() -> InventoryLedger<Arc<Store>, FixedClock> {
        InventoryLedger::new(
            Arc::new(Store::default()),
            FixedClock::new(now()),
            PaginationConfig::default(),
        )
    }

    fn new_product(name: &str, quantity: i64) -> NewProduct {
        NewProduct {
            name: name.into(),
            description: None,
            price: 4.5,
            quantity,
            category: Some("pantry".into()),
            sku: None,
        }
    }

    #[tokio::test]
    async fn create_records_creator_and_defaults_active() {
        let ledger = ledger();
        let product = ledger.create(new_product("Rice", 5), ADMIN).await.unwrap();
        assert_eq!(product.created_by_id, ADMIN);
        assert!(product.is_active);
        assert_eq!(product.quantity, 5);
        assert_eq!(product.created_at, now());
    }

    #[tokio::test]
    async fn create_rejects_bad_fields() {
        let ledger = ledger();
        let cases = [
            new_product("  ", 1),
            new_product("Rice", -1),
            NewProduct {
                price: -0.01,
                ..new_product("Rice", 1)
            },
            NewProduct {
                price: f64::INFINITY,
                ..new_product("Rice", 1)
            },
        ];
        for dto in cases {
            let err = ledger.create(dto, ADMIN).await.unwrap_err();
            assert_eq!(err.reason(), Reason::ValidationFailed);
        }
    }

    #[tokio::test]
    async fn duplicate_sku_is_a_conflict() {
        let ledger = ledger();
        let with_sku = NewProduct {
            sku: Some("RICE-1".into()),
            ..new_product("Rice", 1)
        };
        ledger.create(with_sku.clone(), ADMIN).await.unwrap();
        let err = ledger.create(with_sku, ADMIN).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.reason(), Reason::AlreadyExists);
    }

    #[tokio::test]
    async fn add_quantity_requires_a_positive_delta() {
        let ledger = ledger();
        let product = ledger.create(new_product("Rice", 0), ADMIN).await.unwrap();
        for delta in [0, -3] {
            let err = ledger.add_quantity(product.id, delta, MANAGER).await.unwrap_err();
            assert_eq!(err.reason(), Reason::InvalidQuantity);
        }
        let updated = ledger.add_quantity(product.id, 7, MANAGER).await.unwrap();
        assert_eq!(updated.quantity, 7);
        assert_eq!(updated.updated_by_id, Some(MANAGER));

        let err = ledger
            .add_quantity(ProductId::new(404), 1, MANAGER)
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::not_found(Reason::ProductNotFound));
    }

    #[tokio::test]
    async fn over_purchase_is_rejected_without_mutation() {
        let ledger = ledger();
        let product = ledger.create(new_product("Rice", 2), ADMIN).await.unwrap();

        let err = ledger.purchase(product.id, 3, ADMIN).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.reason(), Reason::InsufficientStock);
        assert_eq!(ledger.get(product.id).await.unwrap().quantity, 2);

        let bought = ledger.purchase(product.id, 2, ADMIN).await.unwrap();
        assert_eq!(bought.quantity, 0);
        let status = ledger.get_status(product.id).await.unwrap();
        assert!(!status.is_active);
    }

    #[tokio::test]
    async fn update_validates_and_stamps_actor() {
        let ledger = ledger();
        let product = ledger.create(new_product("Rice", 2), ADMIN).await.unwrap();

        let err = ledger
            .update_fields(product.id, ProductPatch::default(), ADMIN)
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Reason::ValidationFailed);

        let err = ledger
            .update_fields(
                product.id,
                ProductPatch {
                    price: Some(-1.0),
                    ..Default::default()
                },
                ADMIN,
            )
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Reason::ValidationFailed);

        let updated = ledger
            .update_fields(
                product.id,
                ProductPatch {
                    name: Some("Basmati".into()),
                    ..Default::default()
                },
                ADMIN,
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Basmati");
        assert_eq!(updated.updated_by_id, Some(ADMIN));
    }

    #[tokio::test]
    async fn delete_is_unconditional_and_final() {
        let ledger = ledger();
        let product = ledger.create(new_product("Rice", 9), ADMIN).await.unwrap();
        ledger.delete(product.id).await.unwrap();
        assert_eq!(
            ledger.get(product.id).await.unwrap_err().reason(),
            Reason::ProductNotFound
        );
        assert_eq!(
            ledger.delete(product.id).await.unwrap_err().reason(),
            Reason::ProductNotFound
        );
    }

    #[tokio::test]
    async fn list_filters_and_sorts() {
        let ledger = ledger();
        for (name, qty) in [("Rice", 3), ("Brown Rice", 0), ("Beans", 3)] {
            ledger.create(new_product(name, qty), ADMIN).await.unwrap();
        }

        let rice = ledger
            .list(
                ProductFilter {
                    name: Some("rice".into()),
                    ..Default::default()
                },
                Some(&SortRequest::by("name", SortDirection::Asc)),
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(rice.total, 2);
        assert_eq!(rice.items[0].name, "Brown Rice");

        let three = ledger
            .list(
                ProductFilter {
                    quantity: Some(3),
                    ..Default::default()
                },
                None,
                PageRequest::new(1, 1),
            )
            .await
            .unwrap();
        assert_eq!(three.total, 2);
        assert_eq!(three.items.len(), 1);
        assert_eq!(three.total_pages, 2);

        let err = ledger
            .list(
                ProductFilter::default(),
                Some(&SortRequest::by("createdById", SortDirection::Asc)),
                PageRequest::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.reason(), Reason::InvalidSortParam);
    }

    #[tokio::test]
    async fn non_finite_price_bounds_never_reach_the_repository() {
        let mut repository = MockProductRepository::new();
        repository.expect_find_many().never();
        let ledger = InventoryLedger::new(
            repository,
            FixedClock::new(now()),
            PaginationConfig::default(),
        );

        for filter in [
            ProductFilter {
                min_price: Some(f64::NAN),
                ..Default::default()
            },
            ProductFilter {
                max_price: Some(f64::INFINITY),
                ..Default::default()
            },
        ] {
            let err = ledger
                .list(filter, None, PageRequest::default())
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput);
            assert_eq!(err.reason(), Reason::ValidationFailed);
        }
    }

    #[tokio::test]
    async fn invalid_delta_never_reaches_the_repository() {
        let mut repository = MockProductRepository::new();
        repository.expect_increment_quantity().never();
        repository.expect_decrement_quantity_if_available().never();
        let ledger = InventoryLedger::new(
            repository,
            FixedClock::new(now()),
            PaginationConfig::default(),
        );

        assert!(ledger.add_quantity(ProductId::new(1), 0, MANAGER).await.is_err());
        assert!(ledger.purchase(ProductId::new(1), -2, ADMIN).await.is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Add(i64),
            Purchase(i64),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![(-2i64..20).prop_map(Op::Add), (-2i64..20).prop_map(Op::Purchase)]
        }

        proptest! {
            #[test]
            fn quantity_tracks_successful_movements(
                initial in 0i64..50,
                ops in prop::collection::vec(op(), 0..40),
            ) {
                let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
                let ledger = ledger();
                let product = runtime
                    .block_on(ledger.create(new_product("Flour", initial), ADMIN))
                    .unwrap();

                let mut expected = initial;
                for op in ops {
                    match op {
                        Op::Add(delta) => {
                            let added = ledger.add_quantity(product.id, delta, MANAGER);
                            if runtime.block_on(added).is_ok() {
                                expected += delta;
                            }
                        }
                        Op::Purchase(delta) => {
                            match runtime.block_on(ledger.purchase(product.id, delta, ADMIN)) {
                                Ok(_) => expected -= delta,
                                Err(e) => prop_assert!(matches!(
                                    e.reason(),
                                    Reason::InsufficientStock | Reason::InvalidQuantity
                                )),
                            }
                        }
                    }
                    prop_assert!(expected >= 0);
                }

                let stored = runtime.block_on(ledger.get(product.id)).unwrap();
                prop_assert_eq!(stored.quantity, expected.unsigned_abs());
            }
        }
    }
}
