use std::sync::Arc;

use async_trait::async_trait;

use bazaar_core::{OrderBy, Page, Pagination, ProductId, RepositoryResult};

use crate::{
    Decrement, Product, ProductChanges, ProductDraft, ProductFilter, ProductSortField,
    StockMovement,
};

/// Persistence port for products.
///
/// The two quantity primitives must each be a single atomic step against
/// storage: concurrent purchases can never jointly take more than was on hand.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// `RepositoryError::Conflict` on a duplicate SKU.
    async fn create(&self, draft: ProductDraft) -> RepositoryResult<Product>;

    async fn find_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>>;

    async fn find_many(
        &self,
        filter: ProductFilter,
        order: OrderBy<ProductSortField>,
        window: Pagination,
    ) -> RepositoryResult<Page<Product>>;

    async fn update(&self, id: ProductId, changes: ProductChanges) -> RepositoryResult<Product>;

    async fn delete(&self, id: ProductId) -> RepositoryResult<()>;

    /// Add `movement.amount` to the stored quantity.
    async fn increment_quantity(
        &self,
        id: ProductId,
        movement: StockMovement,
    ) -> RepositoryResult<Product>;

    /// Subtract `movement.amount` only if at least that much is on hand.
    async fn decrement_quantity_if_available(
        &self,
        id: ProductId,
        movement: StockMovement,
    ) -> RepositoryResult<Decrement>;
}

#[async_trait]
impl<R> ProductRepository for Arc<R>
where
    R: ProductRepository + ?Sized,
{
    async fn create(&self, draft: ProductDraft) -> RepositoryResult<Product> {
        (**self).create(draft).await
    }

    async fn find_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        (**self).find_by_id(id).await
    }

    async fn find_many(
        &self,
        filter: ProductFilter,
        order: OrderBy<ProductSortField>,
        window: Pagination,
    ) -> RepositoryResult<Page<Product>> {
        (**self).find_many(filter, order, window).await
    }

    async fn update(&self, id: ProductId, changes: ProductChanges) -> RepositoryResult<Product> {
        (**self).update(id, changes).await
    }

    async fn delete(&self, id: ProductId) -> RepositoryResult<()> {
        (**self).delete(id).await
    }

    async fn increment_quantity(
        &self,
        id: ProductId,
        movement: StockMovement,
    ) -> RepositoryResult<Product> {
        (**self).increment_quantity(id, movement).await
    }

    async fn decrement_quantity_if_available(
        &self,
        id: ProductId,
        movement: StockMovement,
    ) -> RepositoryResult<Decrement> {
        (**self).decrement_quantity_if_available(id, movement).await
    }
}
