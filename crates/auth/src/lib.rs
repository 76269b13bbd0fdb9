//! `bazaar-auth`: authentication/authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage: it defines the
//! roles, the static permission table, the policy that evaluates it, and the
//! traits through which principals and user accounts are resolved.

pub mod authorize;
pub mod claims;
pub mod directory;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthorizationExplanation, AuthorizationPolicy, AuthzError, Decision};
pub use claims::{
    Claims, ClaimsIdentityResolver, IdentityResolver, StaticIdentityResolver, TokenDecoder,
    TokenValidationError, validate_claims,
};
pub use directory::{UserDirectory, UserRecord};
pub use permissions::{Action, Permission, PermissionTable, PermissionTableBuilder, ResourceClass};
pub use principal::Principal;
pub use roles::{Role, UnknownRole};
