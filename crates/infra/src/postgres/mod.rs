//! Postgres-backed repositories.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | RepositoryError |
//! |------------|----------------------|-----------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | RowNotFound | N/A | `NotFound` |
//! | anything else | any | `Backend` |
//!
//! Queries are built at runtime; sort columns are spliced in only from the
//! closed [`SortField`](bazaar_core::SortField) enums, every value is bound.

mod products;
mod promotions;
mod users;

pub use products::PostgresProductRepository;
pub use promotions::PostgresPromotionRepository;
pub use users::PostgresUserDirectory;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use bazaar_core::{RepositoryError, RepositoryResult, SortDirection};

use crate::config::InfraConfig;

/// Schema for promotions, products and the user directory.
pub const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

/// Open a pool against `config.database_url`.
pub async fn connect(config: &InfraConfig) -> RepositoryResult<PgPool> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| RepositoryError::backend("no database url configured"))?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))?;
    info!(max_connections = config.max_connections, "database pool ready");
    Ok(pool)
}

/// Create tables and indexes if they do not exist yet.
pub async fn apply_schema(pool: &PgPool) -> RepositoryResult<()> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("apply_schema", e))?;
    Ok(())
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => RepositoryError::Conflict(msg),
                _ => RepositoryError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        sqlx::Error::PoolClosed => {
            RepositoryError::Backend(format!("connection pool closed in {operation}"))
        }
        other => RepositoryError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

/// Repository ids are positive and always fit a BIGINT.
pub(crate) fn to_db_id(id: u64) -> RepositoryResult<i64> {
    i64::try_from(id).map_err(|_| RepositoryError::backend(format!("id {id} out of range")))
}

pub(crate) fn from_db_u64(column: &str, value: i64) -> RepositoryResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepositoryError::backend(format!("negative {column} in row: {value}")))
}

pub(crate) fn direction_sql(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    }
}

/// `ILIKE` pattern matching `needle` anywhere, with wildcards escaped.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
