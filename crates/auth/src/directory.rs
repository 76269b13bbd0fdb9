use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use bazaar_core::{RepositoryResult, UserId};

use crate::Role;

/// Account as stored by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

/// Read-only lookup of user accounts.
///
/// Used to check that a promotion's supplier exists and holds the supplier
/// role before anything is written.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<UserRecord>>;
}

#[async_trait]
impl<D> UserDirectory for Arc<D>
where
    D: UserDirectory + ?Sized,
{
    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<UserRecord>> {
        (**self).find_user(id).await
    }
}
