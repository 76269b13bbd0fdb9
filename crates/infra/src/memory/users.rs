use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use bazaar_auth::{UserDirectory, UserRecord};
use bazaar_core::{RepositoryResult, UserId};

use super::poisoned;

/// In-memory user directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id, u)).collect()),
        }
    }

    pub fn upsert(&self, user: UserRecord) -> RepositoryResult<()> {
        let mut users = self.users.write().map_err(poisoned)?;
        users.insert(user.id, user);
        Ok(())
    }

    fn get(&self, id: UserId) -> RepositoryResult<Option<UserRecord>> {
        let users = self.users.read().map_err(poisoned)?;
        Ok(users.get(&id).cloned())
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_user(&self, id: UserId) -> RepositoryResult<Option<UserRecord>> {
        self.get(id)
    }
}
