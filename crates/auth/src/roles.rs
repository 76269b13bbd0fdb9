use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role carried by an authenticated principal.
///
/// The set is closed: the permission table is keyed by these variants, and an
/// unrecognized role string never authenticates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[serde(rename = "SUPERADMIN")]
    SuperAdmin,
    Admin,
    Supplier,
    WarehouseManager,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::SuperAdmin,
        Role::Admin,
        Role::Supplier,
        Role::WarehouseManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SUPERADMIN",
            Role::Admin => "ADMIN",
            Role::Supplier => "SUPPLIER",
            Role::WarehouseManager => "WAREHOUSE_MANAGER",
        }
    }

    /// Admin-tier roles create promotions directly in the approved state.
    pub fn is_admin_tier(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUPERADMIN" | "SUPER_ADMIN" => Ok(Role::SuperAdmin),
            "ADMIN" => Ok(Role::Admin),
            "SUPPLIER" => Ok(Role::Supplier),
            "WAREHOUSE_MANAGER" => Ok(Role::WarehouseManager),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}
