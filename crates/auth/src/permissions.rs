use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::Role;

/// Entity class an action targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceClass {
    Promotion,
    Product,
}

impl ResourceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Promotion => "promotion",
            ResourceClass::Product => "product",
        }
    }
}

/// Operation being attempted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Create,
    Read,
    Update,
    StatusUpdate,
    Delete,
    ListMine,
    ListAll,
    AddQuantity,
    Purchase,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::StatusUpdate => "status-update",
            Action::Delete => "delete",
            Action::ListMine => "list-mine",
            Action::ListAll => "list-all",
            Action::AddQuantity => "add-quantity",
            Action::Purchase => "purchase",
        }
    }
}

/// Permission identifier: an action on a resource class (e.g. `product.purchase`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub resource: ResourceClass,
    pub action: Action,
}

impl Permission {
    pub fn new(resource: ResourceClass, action: Action) -> Self {
        Self { resource, action }
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.resource.as_str(), self.action.as_str())
    }
}

/// Static role grants, keyed by permission.
///
/// Built once and injected into the [`AuthorizationPolicy`](crate::AuthorizationPolicy);
/// there is no way to mutate a table after construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    grants: HashMap<Permission, BTreeSet<Role>>,
}

impl PermissionTable {
    pub fn builder() -> PermissionTableBuilder {
        PermissionTableBuilder::default()
    }

    /// Role grants for the promotions and warehouse services.
    pub fn standard() -> Self {
        use Action::*;
        use ResourceClass::*;
        use Role::*;

        Self::builder()
            .grant(Promotion, Create, [SuperAdmin, Admin, Supplier])
            .grant(Promotion, Read, [SuperAdmin, Admin, Supplier])
            .grant(Promotion, Update, [SuperAdmin, Admin])
            .grant(Promotion, StatusUpdate, [SuperAdmin, Admin])
            .grant(Promotion, Delete, [SuperAdmin, Admin])
            .grant(Promotion, ListMine, [Supplier])
            .grant(Promotion, ListAll, [SuperAdmin, Admin])
            .grant(Product, Create, [SuperAdmin, Admin])
            .grant(Product, Read, Role::ALL)
            .grant(Product, Update, [SuperAdmin, Admin])
            .grant(Product, Delete, [SuperAdmin, Admin])
            .grant(Product, ListAll, Role::ALL)
            .grant(Product, AddQuantity, [WarehouseManager])
            .grant(Product, Purchase, [SuperAdmin, Admin])
            .build()
    }

    pub fn allows(&self, role: Role, permission: Permission) -> bool {
        self.grants
            .get(&permission)
            .is_some_and(|roles| roles.contains(&role))
    }

    /// Roles granted `permission`, in a stable order.
    pub fn roles_for(&self, permission: Permission) -> Vec<Role> {
        self.grants
            .get(&permission)
            .map(|roles| roles.iter().copied().collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct PermissionTableBuilder {
    grants: HashMap<Permission, BTreeSet<Role>>,
}

impl PermissionTableBuilder {
    pub fn grant(
        mut self,
        resource: ResourceClass,
        action: Action,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        self.grants
            .entry(Permission::new(resource, action))
            .or_default()
            .extend(roles);
        self
    }

    pub fn build(self) -> PermissionTable {
        PermissionTable {
            grants: self.grants,
        }
    }
}
