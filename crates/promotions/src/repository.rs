use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use bazaar_core::{OrderBy, Page, Pagination, PromotionId, RepositoryResult};

use crate::{
    Promotion, PromotionChanges, PromotionDraft, PromotionQuery, PromotionSortField, Removal,
};

/// Persistence port for promotions.
///
/// Implementations own id assignment. `find_by_id` returns soft-deleted rows as
/// well; hiding them is the lifecycle engine's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromotionRepository: Send + Sync {
    async fn create(&self, draft: PromotionDraft) -> RepositoryResult<Promotion>;

    async fn find_by_id(&self, id: PromotionId) -> RepositoryResult<Option<Promotion>>;

    /// Filtered, ordered, windowed listing plus the unwindowed match count.
    async fn find_many(
        &self,
        query: PromotionQuery,
        order: OrderBy<PromotionSortField>,
        window: Pagination,
    ) -> RepositoryResult<Page<Promotion>>;

    /// Apply `changes`; `RepositoryError::NotFound` when the row is missing.
    async fn update(&self, id: PromotionId, changes: PromotionChanges)
    -> RepositoryResult<Promotion>;

    /// Soft-delete unless the row is live at `at`. The check and the write
    /// are a single atomic step against storage. `RepositoryError::NotFound`
    /// when the row is missing or already deleted.
    async fn soft_delete_unless_live(
        &self,
        id: PromotionId,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Removal>;

    /// Physical removal.
    async fn delete(&self, id: PromotionId) -> RepositoryResult<()>;
}

#[async_trait]
impl<R> PromotionRepository for Arc<R>
where
    R: PromotionRepository + ?Sized,
{
    async fn create(&self, draft: PromotionDraft) -> RepositoryResult<Promotion> {
        (**self).create(draft).await
    }

    async fn find_by_id(&self, id: PromotionId) -> RepositoryResult<Option<Promotion>> {
        (**self).find_by_id(id).await
    }

    async fn find_many(
        &self,
        query: PromotionQuery,
        order: OrderBy<PromotionSortField>,
        window: Pagination,
    ) -> RepositoryResult<Page<Promotion>> {
        (**self).find_many(query, order, window).await
    }

    async fn update(
        &self,
        id: PromotionId,
        changes: PromotionChanges,
    ) -> RepositoryResult<Promotion> {
        (**self).update(id, changes).await
    }

    async fn soft_delete_unless_live(
        &self,
        id: PromotionId,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Removal> {
        (**self).soft_delete_unless_live(id, at).await
    }

    async fn delete(&self, id: PromotionId) -> RepositoryResult<()> {
        (**self).delete(id).await
    }
}
