use serde::{Deserialize, Serialize};

use bazaar_core::UserId;

use crate::Role;

/// The authenticated actor of a request.
///
/// Built once per request by an [`IdentityResolver`](crate::IdentityResolver)
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: UserId, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            role,
        }
    }
}
