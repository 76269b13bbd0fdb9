use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use bazaar_core::{DomainError, Reason};

use crate::{Action, Permission, PermissionTable, Principal, ResourceClass, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("unauthorized: no authenticated principal")]
    Unauthorized,

    #[error("forbidden: role {role} lacks permission '{permission}'")]
    Forbidden { role: Role, permission: Permission },
}

impl AuthzError {
    pub fn reason(&self) -> Reason {
        match self {
            AuthzError::Unauthorized => Reason::Unauthorized,
            AuthzError::Forbidden { .. } => Reason::Forbidden,
        }
    }
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Unauthorized => DomainError::Unauthorized,
            AuthzError::Forbidden { permission, .. } => {
                DomainError::Forbidden(format!("missing permission '{permission}'"))
            }
        }
    }
}

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(AuthzError),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), AuthzError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(e) => Err(e),
        }
    }
}

/// Role-based policy over a static [`PermissionTable`].
///
/// - No IO
/// - No panics
/// - Evaluated before any validation or repository access
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    table: PermissionTable,
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self::new(PermissionTable::standard())
    }
}

impl AuthorizationPolicy {
    pub fn new(table: PermissionTable) -> Self {
        Self { table }
    }

    pub fn decide(
        &self,
        principal: Option<&Principal>,
        action: Action,
        resource: ResourceClass,
    ) -> Decision {
        let Some(principal) = principal else {
            return Decision::Deny(AuthzError::Unauthorized);
        };
        let permission = Permission::new(resource, action);
        if self.table.allows(principal.role, permission) {
            Decision::Allow
        } else {
            Decision::Deny(AuthzError::Forbidden {
                role: principal.role,
                permission,
            })
        }
    }

    /// Authorize and log denials.
    pub fn authorize(
        &self,
        principal: Option<&Principal>,
        action: Action,
        resource: ResourceClass,
    ) -> Result<(), AuthzError> {
        let decision = self.decide(principal, action, resource);
        if let Decision::Deny(err) = &decision {
            warn!(
                principal_id = principal.map(|p| p.id.get()),
                action = action.as_str(),
                resource = resource.as_str(),
                reason = %err.reason(),
                "authorization denied"
            );
        }
        decision.into_result()
    }

    /// Explain why a decision was (or would be) made.
    pub fn explain(
        &self,
        principal: Option<&Principal>,
        action: Action,
        resource: ResourceClass,
    ) -> AuthorizationExplanation {
        let permission = Permission::new(resource, action);
        let allowed_roles = self.table.roles_for(permission);
        let decision = self.decide(principal, action, resource);

        let reason = match (&decision, principal) {
            (Decision::Allow, Some(p)) => {
                format!("role {} is granted '{permission}'", p.role)
            }
            (Decision::Deny(AuthzError::Forbidden { role, .. }), _) => {
                format!("role {role} is not granted '{permission}'")
            }
            _ => "no authenticated principal".to_string(),
        };

        AuthorizationExplanation {
            permission: permission.to_string(),
            granted: decision.is_allowed(),
            reason,
            role: principal.map(|p| p.role),
            allowed_roles,
        }
    }
}

/// Detailed, auditable explanation of an authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub permission: String,
    pub granted: bool,
    pub reason: String,
    pub role: Option<Role>,
    pub allowed_roles: Vec<Role>,
}
