use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;

use bazaar_core::{
    OrderBy, Page, Pagination, PromotionId, RepositoryError, RepositoryResult, UserId,
};
use bazaar_promotions::{
    Promotion, PromotionChanges, PromotionDraft, PromotionQuery, PromotionRepository,
    PromotionSortField, PromotionStatus, Removal,
};

use super::{contains_pattern, direction_sql, from_db_u64, map_sqlx_error, to_db_id};

const COLUMNS: &str = "id, title, description, start_date, end_date, status, supplier_id, \
                       is_deleted, created_at, updated_at";

fn sort_column(field: PromotionSortField) -> &'static str {
    match field {
        PromotionSortField::Id => "id",
        PromotionSortField::Title => "title",
        PromotionSortField::StartDate => "start_date",
        PromotionSortField::EndDate => "end_date",
        PromotionSortField::Status => "status",
        PromotionSortField::CreatedAt => "created_at",
        PromotionSortField::UpdatedAt => "updated_at",
    }
}

/// Postgres-backed promotion repository (`promotions` table).
#[derive(Debug, Clone)]
pub struct PostgresPromotionRepository {
    pool: Arc<PgPool>,
}

impl PostgresPromotionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl PromotionRepository for PostgresPromotionRepository {
    #[instrument(skip(self, draft), fields(supplier_id = %draft.supplier_id), err)]
    async fn create(&self, draft: PromotionDraft) -> RepositoryResult<Promotion> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO promotions (
                title, description, start_date, end_date, status, supplier_id,
                is_deleted, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(draft.status.as_str())
        .bind(to_db_id(draft.supplier_id.get())?)
        .bind(draft.created_at)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_promotion", e))?;

        decode(&row)
    }

    async fn find_by_id(&self, id: PromotionId) -> RepositoryResult<Option<Promotion>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM promotions WHERE id = $1"))
            .bind(to_db_id(id.get())?)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_promotion", e))?;

        row.as_ref().map(decode).transpose()
    }

    #[instrument(skip(self, query), fields(page = window.page, limit = window.limit), err)]
    async fn find_many(
        &self,
        query: PromotionQuery,
        order: OrderBy<PromotionSortField>,
        window: Pagination,
    ) -> RepositoryResult<Page<Promotion>> {
        let status = query.status.map(|s| s.as_str());
        let supplier = query
            .supplier_id
            .map(|s| to_db_id(s.get()))
            .transpose()?;
        let title = query.title_contains.as_deref().map(contains_pattern);

        let predicate = r#"
            ($1::text IS NULL OR status = $1)
            AND ($2::bigint IS NULL OR supplier_id = $2)
            AND ($3::text IS NULL OR title ILIKE $3)
            AND ($4::boolean OR NOT is_deleted)
        "#;

        let total: i64 = sqlx::query(&format!(
            "SELECT COUNT(*) AS total FROM promotions WHERE {predicate}"
        ))
        .bind(status)
        .bind(supplier)
        .bind(title.as_deref())
        .bind(query.include_deleted)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("count_promotions", e))?
        .try_get("total")
        .map_err(|e| map_sqlx_error("count_promotions", e))?;

        let rows = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM promotions WHERE {predicate} \
             ORDER BY {} {}, id ASC LIMIT $5 OFFSET $6",
            sort_column(order.field),
            direction_sql(order.direction),
        ))
        .bind(status)
        .bind(supplier)
        .bind(title.as_deref())
        .bind(query.include_deleted)
        .bind(to_db_id(window.limit)?)
        .bind(to_db_id(window.offset())?)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_promotions", e))?;

        Ok(Page {
            items: rows.iter().map(decode).collect::<RepositoryResult<_>>()?,
            total: from_db_u64("count", total)?,
        })
    }

    #[instrument(skip(self, changes), fields(promotion_id = %id), err)]
    async fn update(
        &self,
        id: PromotionId,
        changes: PromotionChanges,
    ) -> RepositoryResult<Promotion> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE promotions SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                start_date = COALESCE($4, start_date),
                end_date = COALESCE($5, end_date),
                status = COALESCE($6, status),
                is_deleted = COALESCE($7, is_deleted),
                updated_at = $8
            WHERE id = $1
            RETURNING {COLUMNS}
            "#
        ))
        .bind(to_db_id(id.get())?)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(changes.status.map(|s| s.as_str()))
        .bind(changes.is_deleted)
        .bind(changes.updated_at)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_promotion", e))?
        .ok_or(RepositoryError::NotFound)?;

        decode(&row)
    }

    #[instrument(skip(self), fields(promotion_id = %id), err)]
    async fn soft_delete_unless_live(
        &self,
        id: PromotionId,
        at: DateTime<Utc>,
    ) -> RepositoryResult<Removal> {
        let db_id = to_db_id(id.get())?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE promotions SET
                is_deleted = TRUE,
                updated_at = $2
            WHERE id = $1
              AND NOT is_deleted
              AND NOT (status = $3 AND start_date <= $2 AND end_date >= $2)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(db_id)
        .bind(at)
        .bind(PromotionStatus::Approved.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("soft_delete_promotion", e))?;

        if let Some(row) = row {
            return decode(&row).map(Removal::Deleted);
        }

        // Nothing updated: either the row is gone or it is running.
        let current = sqlx::query("SELECT is_deleted FROM promotions WHERE id = $1")
            .bind(db_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("read_promotion_state", e))?;
        let deleted: Option<bool> = current
            .map(|row| row.try_get("is_deleted"))
            .transpose()
            .map_err(|e| map_sqlx_error("read_promotion_state", e))?;
        match deleted {
            Some(false) => Ok(Removal::Live),
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: PromotionId) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM promotions WHERE id = $1")
            .bind(to_db_id(id.get())?)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_promotion", e))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// SQLx row types

#[derive(Debug)]
struct PromotionRow {
    id: i64,
    title: String,
    description: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: String,
    supplier_id: i64,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for PromotionRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(PromotionRow {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            status: row.try_get("status")?,
            supplier_id: row.try_get("supplier_id")?,
            is_deleted: row.try_get("is_deleted")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl TryFrom<PromotionRow> for Promotion {
    type Error = RepositoryError;

    fn try_from(row: PromotionRow) -> Result<Self, Self::Error> {
        let status: PromotionStatus = row
            .status
            .parse()
            .map_err(|_| RepositoryError::backend(format!("unknown status '{}'", row.status)))?;
        Ok(Promotion {
            id: PromotionId::new(from_db_u64("id", row.id)?),
            title: row.title,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            status,
            supplier_id: UserId::new(from_db_u64("supplier_id", row.supplier_id)?),
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode(row: &PgRow) -> RepositoryResult<Promotion> {
    let row = PromotionRow::from_row(row).map_err(|e| map_sqlx_error("decode_promotion", e))?;
    Promotion::try_from(row)
}
