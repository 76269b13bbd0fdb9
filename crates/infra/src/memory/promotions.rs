use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use bazaar_core::{OrderBy, Page, Pagination, PromotionId, RepositoryError, RepositoryResult};
use bazaar_promotions::{
    Promotion, PromotionChanges, PromotionDraft, PromotionQuery, PromotionRepository,
    PromotionSortField, Removal, sort_promotions,
};

use super::poisoned;

#[derive(Debug, Default)]
struct Table {
    next_id: u64,
    rows: BTreeMap<PromotionId, Promotion>,
}

/// In-memory promotion store.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryPromotionRepository {
    table: RwLock<Table>,
}

impl InMemoryPromotionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, draft: PromotionDraft) -> RepositoryResult<Promotion> {
        let mut table = self.table.write().map_err(poisoned)?;
        table.next_id += 1;
        let id = PromotionId::new(table.next_id);
        let promotion = Promotion {
            id,
            title: draft.title,
            description: draft.description,
            start_date: draft.start_date,
            end_date: draft.end_date,
            status: draft.status,
            supplier_id: draft.supplier_id,
            is_deleted: false,
            created_at: draft.created_at,
            updated_at: draft.created_at,
        };
        table.rows.insert(id, promotion.clone());
        Ok(promotion)
    }

    fn get(&self, id: PromotionId) -> RepositoryResult<Option<Promotion>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.get(&id).cloned())
    }

    fn select(
        &self,
        query: &PromotionQuery,
        order: OrderBy<PromotionSortField>,
        window: Pagination,
    ) -> RepositoryResult<Page<Promotion>> {
        let table = self.table.read().map_err(poisoned)?;
        let mut items: Vec<Promotion> = table
            .rows
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        drop(table);

        sort_promotions(&mut items, order);
        let total = items.len() as u64;
        Ok(Page {
            items: window.window(items),
            total,
        })
    }

    fn modify(&self, id: PromotionId, changes: PromotionChanges) -> RepositoryResult<Promotion> {
        let mut table = self.table.write().map_err(poisoned)?;
        let row = table.rows.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        changes.apply(row);
        Ok(row.clone())
    }

    fn retire(&self, id: PromotionId, at: DateTime<Utc>) -> RepositoryResult<Removal> {
        let mut table = self.table.write().map_err(poisoned)?;
        let row = table
            .rows
            .get_mut(&id)
            .filter(|p| !p.is_deleted)
            .ok_or(RepositoryError::NotFound)?;
        if row.is_live(at) {
            return Ok(Removal::Live);
        }
        PromotionChanges::soft_delete(at).apply(row);
        Ok(Removal::Deleted(row.clone()))
    }

    fn remove(&self, id: PromotionId) -> RepositoryResult<()> {
        let mut table = self.table.write().map_err(poisoned)?;
        table
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl PromotionRepository for InMemoryPromotionRepository {
    async fn create(&self, draft: PromotionDraft) -> RepositoryResult<Promotion> {
        self.insert(draft)
    }

    async fn find_by_id(&self, id: PromotionId) -> RepositoryResult<Option<Promotion>> {
        self.get(id)
    }

    async fn find_many(
        &self,
        query: PromotionQuery,
        order: OrderBy<PromotionSortField>,
        window: Pagination,
    ) -> RepositoryResult<Page<Promotion>> {
        self.select(&query, order, window)
    }

    async fn update(
        &self,
        id: PromotionId,
        changes: PromotionChanges,
    ) -> RepositoryResult<Promotion> {
        self.modify(id, changes)
    }

    async fn soft_delete_unless_live(
        &self,
        id: PromotionId,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Removal> {
        self.retire(id, at)
    }

    async fn delete(&self, id: PromotionId) -> RepositoryResult<()> {
        self.remove(id)
    }
}
