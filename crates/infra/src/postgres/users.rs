use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use bazaar_auth::{Role, UserDirectory, UserRecord};
use bazaar_core::{RepositoryError, RepositoryResult, UserId};

use super::{map_sqlx_error, to_db_id};

/// Read-only view over the `users` table.
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: Arc<PgPool>,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<UserRecord>> {
        let row = sqlx::query("SELECT email, role FROM users WHERE id = $1")
            .bind(to_db_id(id.get())?)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let email: String = row
            .try_get("email")
            .map_err(|e| map_sqlx_error("find_user", e))?;
        let role: String = row
            .try_get("role")
            .map_err(|e| map_sqlx_error("find_user", e))?;
        let role: Role = role
            .parse()
            .map_err(|e: bazaar_auth::UnknownRole| RepositoryError::backend(e.to_string()))?;

        Ok(Some(UserRecord { id, email, role }))
    }
}
