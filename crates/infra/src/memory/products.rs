use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use bazaar_core::{OrderBy, Page, Pagination, ProductId, RepositoryError, RepositoryResult};
use bazaar_inventory::{
    Decrement, Product, ProductChanges, ProductDraft, ProductFilter, ProductRepository,
    ProductSortField, StockMovement, sort_products,
};

use super::poisoned;

#[derive(Debug, Default)]
struct Table {
    next_id: u64,
    rows: BTreeMap<ProductId, Product>,
}

impl Table {
    fn sku_taken(&self, sku: Option<&str>, except: Option<ProductId>) -> bool {
        let Some(sku) = sku else {
            return false;
        };
        self.rows
            .values()
            .any(|p| Some(p.id) != except && p.sku.as_deref() == Some(sku))
    }
}

/// In-memory product store.
///
/// Every quantity movement runs inside one write-lock critical section, so
/// the check and the write of a conditional decrement cannot interleave.
#[derive(Debug, Default)]
pub struct InMemoryProductRepository {
    table: RwLock<Table>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, draft: ProductDraft) -> RepositoryResult<Product> {
        let mut table = self.table.write().map_err(poisoned)?;
        if table.sku_taken(draft.sku.as_deref(), None) {
            return Err(RepositoryError::Conflict(format!(
                "sku '{}' already exists",
                draft.sku.unwrap_or_default()
            )));
        }
        table.next_id += 1;
        let id = ProductId::new(table.next_id);
        let product = Product {
            id,
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
        table.rows.insert(id, product.clone());
        Ok(product)
    }

    fn get(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        let table = self.table.read().map_err(poisoned)?;
        Ok(table.rows.get(&id).cloned())
    }

    fn select(
        &self,
        filter: &ProductFilter,
        order: OrderBy<ProductSortField>,
        window: Pagination,
    ) -> RepositoryResult<Page<Product>> {
        let table = self.table.read().map_err(poisoned)?;
        let mut items: Vec<Product> = table
            .rows
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        drop(table);

        sort_products(&mut items, order);
        let total = items.len() as u64;
        Ok(Page {
            items: window.window(items),
            total,
        })
    }

    fn modify(&self, id: ProductId, changes: ProductChanges) -> RepositoryResult<Product> {
        let mut table = self.table.write().map_err(poisoned)?;
        if table.sku_taken(changes.sku.as_deref(), Some(id)) {
            return Err(RepositoryError::Conflict("sku already exists".into()));
        }
        let row = table.rows.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        changes.apply(row);
        Ok(row.clone())
    }

    fn remove(&self, id: ProductId) -> RepositoryResult<()> {
        let mut table = self.table.write().map_err(poisoned)?;
        table
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn increment(&self, id: ProductId, movement: StockMovement) -> RepositoryResult<Product> {
        let mut table = self.table.write().map_err(poisoned)?;
        let row = table.rows.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        row.quantity = row
            .quantity
            .checked_add(movement.amount)
            .ok_or_else(|| RepositoryError::backend("quantity overflow"))?;
        row.updated_by_id = Some(movement.actor);
        row.updated_at = movement.at;
        Ok(row.clone())
    }

    fn decrement(&self, id: ProductId, movement: StockMovement) -> RepositoryResult<Decrement> {
        let mut table = self.table.write().map_err(poisoned)?;
        let row = table.rows.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        let Some(remaining) = row.quantity.checked_sub(movement.amount) else {
            return Ok(Decrement::Insufficient {
                available: row.quantity,
            });
        };
        row.quantity = remaining;
        row.updated_by_id = Some(movement.actor);
        row.updated_at = movement.at;
        Ok(Decrement::Applied(row.clone()))
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn create(&self, draft: ProductDraft) -> RepositoryResult<Product> {
        self.insert(draft)
    }

    async fn find_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        self.get(id)
    }

    async fn find_many(
        &self,
        filter: ProductFilter,
        order: OrderBy<ProductSortField>,
        window: Pagination,
    ) -> RepositoryResult<Page<Product>> {
        self.select(&filter, order, window)
    }

    async fn update(&self, id: ProductId, changes: ProductChanges) -> RepositoryResult<Product> {
        self.modify(id, changes)
    }

    async fn delete(&self, id: ProductId) -> RepositoryResult<()> {
        self.remove(id)
    }

    async fn increment_quantity(
        &self,
        id: ProductId,
        movement: StockMovement,
    ) -> RepositoryResult<Product> {
        self.increment(id, movement)
    }

    async fn decrement_quantity_if_available(
        &self,
        id: ProductId,
        movement: StockMovement,
    ) -> RepositoryResult<Decrement> {
        self.decrement(id, movement)
    }
}
