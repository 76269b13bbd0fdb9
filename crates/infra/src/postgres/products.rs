use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use bazaar_core::{OrderBy, Page, Pagination, ProductId, RepositoryError, RepositoryResult, UserId};
use bazaar_inventory::{
    Decrement, Product, ProductChanges, ProductDraft, ProductFilter, ProductRepository,
    ProductSortField, StockMovement,
};

use super::{contains_pattern, direction_sql, from_db_u64, map_sqlx_error, to_db_id};

const COLUMNS: &str = "id, name, description, price, quantity, category, sku, is_active, \
                       created_by_id, updated_by_id, created_at, updated_at";

fn sort_column(field: ProductSortField) -> &'static str {
    match field {
        ProductSortField::Id => "id",
        ProductSortField::Name => "name",
        ProductSortField::Price => "price",
        ProductSortField::Quantity => "quantity",
        ProductSortField::Category => "category",
        ProductSortField::CreatedAt => "created_at",
        ProductSortField::UpdatedAt => "updated_at",
    }
}

/// Postgres-backed product repository (`products` table).
///
/// Quantity movements are single statements, so row-level locking in
/// Postgres serializes concurrent purchases of the same product.
#[derive(Debug, Clone)]
pub struct PostgresProductRepository {
    pool: Arc<PgPool>,
}

impl PostgresProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    async fn current_quantity(&self, id: i64) -> RepositoryResult<Option<u64>> {
        let row = sqlx::query("SELECT quantity FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("read_quantity", e))?;
        match row {
            Some(row) => {
                let quantity: i64 = row
                    .try_get("quantity")
                    .map_err(|e| map_sqlx_error("read_quantity", e))?;
                Ok(Some(from_db_u64("quantity", quantity)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    #[instrument(skip(self, draft), fields(created_by_id = %draft.created_by_id), err)]
    async fn create(&self, draft: ProductDraft) -> RepositoryResult<Product> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO products (
                name, description, price, quantity, category, sku, is_active,
                created_by_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&draft.name)
        .bind(draft.description.as_deref())
        .bind(draft.price)
        .bind(to_db_id(draft.quantity)?)
        .bind(draft.category.as_deref())
        .bind(draft.sku.as_deref())
        .bind(draft.is_active)
        .bind(to_db_id(draft.created_by_id.get())?)
        .bind(draft.created_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_product", e))?;

        decode(&row)
    }

    async fn find_by_id(&self, id: ProductId) -> RepositoryResult<Option<Product>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM products WHERE id = $1"))
            .bind(to_db_id(id.get())?)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_product", e))?;

        row.as_ref().map(decode).transpose()
    }

    #[instrument(skip(self, filter), fields(page = window.page, limit = window.limit), err)]
    async fn find_many(
        &self,
        filter: ProductFilter,
        order: OrderBy<ProductSortField>,
        window: Pagination,
    ) -> RepositoryResult<Page<Product>> {
        let name = filter.name.as_deref().map(contains_pattern);
        let quantity = filter.quantity.map(to_db_id).transpose()?;

        let predicate = r#"
            ($1::text IS NULL OR category = $1)
            AND ($2::boolean IS NULL OR is_active = $2)
            AND ($3::text IS NULL OR name ILIKE $3)
            AND ($4::float8 IS NULL OR price >= $4)
            AND ($5::float8 IS NULL OR price <= $5)
            AND ($6::bigint IS NULL OR quantity = $6)
        "#;

        let total: i64 = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM products WHERE {predicate}"
        ))
        .bind(filter.category.as_deref())
        .bind(filter.is_active)
        .bind(name.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(quantity)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_products", e))?
        .try_get("total")
        .map_err(|e| map_sqlx_error("count_products", e))?;

        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM products WHERE {predicate} \
             ORDER BY {} {}, id ASC LIMIT $7 OFFSET $8",
            sort_column(order.field),
            direction_sql(order.direction),
        ))
        .bind(filter.category.as_deref())
        .bind(filter.is_active)
        .bind(name.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(quantity)
        .bind(to_db_id(window.limit)?)
        .bind(to_db_id(window.offset())?)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        Ok(Page {
            items: rows.iter().map(decode).collect::<RepositoryResult<_>>()?,
            total: from_db_u64("count", total)?,
        })
    }

    #[instrument(skip(self, changes), fields(product_id = %id), err)]
    async fn update(&self, id: ProductId, changes: ProductChanges) -> RepositoryResult<Product> {
        let quantity = changes.quantity.map(to_db_id).transpose()?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                quantity = COALESCE($5, quantity),
                category = COALESCE($6, category),
                sku = COALESCE($7, sku),
                is_active = COALESCE($8, is_active),
                updated_by_id = $9,
                updated_at = $10
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(to_db_id(id.get())?)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.price)
        .bind(quantity)
        .bind(changes.category.as_deref())
        .bind(changes.sku.as_deref())
        .bind(changes.is_active)
        .bind(to_db_id(changes.updated_by_id.get())?)
        .bind(changes.updated_at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?
        .ok_or(RepositoryError::NotFound)?;

        decode(&row)
    }

    async fn delete(&self, id: ProductId) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(to_db_id(id.get())?)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_product", e))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, movement), fields(product_id = %id, amount = movement.amount), err)]
    async fn increment_quantity(
        &self,
        id: ProductId,
        movement: StockMovement,
    ) -> RepositoryResult<Product> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                quantity = quantity + $2,
                updated_by_id = $3,
                updated_at = $4
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(to_db_id(id.get())?)
        .bind(to_db_id(movement.amount)?)
        .bind(to_db_id(movement.actor.get())?)
        .bind(movement.at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("increment_quantity", e))?
        .ok_or(RepositoryError::NotFound)?;

        decode(&row)
    }

    #[instrument(skip(self, movement), fields(product_id = %id, amount = movement.amount), err)]
    async fn decrement_quantity_if_available(
        &self,
        id: ProductId,
        movement: StockMovement,
    ) -> RepositoryResult<Decrement> {
        let db_id = to_db_id(id.get())?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE products SET
                quantity = quantity - $2,
                updated_by_id = $3,
                updated_at = $4
            WHERE id = $1 AND quantity >= $2
            RETURNING {COLUMNS}
            "#
        ))
        .bind(db_id)
        .bind(to_db_id(movement.amount)?)
        .bind(to_db_id(movement.actor.get())?)
        .bind(movement.at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("decrement_quantity", e))?;

        if let Some(row) = row {
            return decode(&row).map(Decrement::Applied);
        }

        // Nothing updated: either the row is gone or stock was short.
        match self.current_quantity(db_id).await? {
            Some(available) => Ok(Decrement::Insufficient { available }),
            None => Err(RepositoryError::NotFound),
        }
    }
}

// SQLx row types

#[derive(Debug)]
struct ProductRow {
    id: i64,
    name: String,
    description: Option<String>,
    price: f64,
    quantity: i64,
    category: Option<String>,
    sku: Option<String>,
    is_active: bool,
    created_by_id: i64,
    updated_by_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            quantity: row.try_get("quantity")?,
            category: row.try_get("category")?,
            sku: row.try_get("sku")?,
            is_active: row.try_get("is_active")?,
            created_by_id: row.try_get("created_by_id")?,
            updated_by_id: row.try_get("updated_by_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: ProductId::new(from_db_u64("id", row.id)?),
            name: row.name,
            description: row.description,
            price: row.price,
            quantity: from_db_u64("quantity", row.quantity)?,
            category: row.category,
            sku: row.sku,
            is_active: row.is_active,
            created_by_id: UserId::new(from_db_u64("created_by_id", row.created_by_id)?),
            updated_by_id: row
                .updated_by_id
                .map(|v| from_db_u64("updated_by_id", v).map(UserId::new))
                .transpose()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode(row: &PgRow) -> RepositoryResult<Product> {
    let row = ProductRow::from_row(row).map_err(|e| map_sqlx_error("decode_product", e))?;
    Product::try_from(row)
}
