use anyhow::Error;
use once_cell::sync::Lazy;
use rocket::serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewOwnProfile,
    AuthorRecipes,
    ManageOwnRecipes,
    ManageFavorites,
    ManageShoppingCart,
    ManageSubscriptions,

    ManageAllRecipes,
    ManageCatalog,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Role {
    User,
    Admin,
}

static USER_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.insert(Permission::ViewOwnProfile);
    permissions.insert(Permission::AuthorRecipes);
    permissions.insert(Permission::ManageOwnRecipes);
    permissions.insert(Permission::ManageFavorites);
    permissions.insert(Permission::ManageShoppingCart);
    permissions.insert(Permission::ManageSubscriptions);

    permissions
});

static ADMIN_PERMISSIONS: Lazy<HashSet<Permission>> = Lazy::new(|| {
    let mut permissions = HashSet::new();

    permissions.extend(USER_PERMISSIONS.iter().copied());

    permissions.insert(Permission::ManageAllRecipes);
    permissions.insert(Permission::ManageCatalog);

    permissions
});

impl Role {
    pub fn permissions(&self) -> &'static HashSet<Permission> {
        match self {
            Role::User => &USER_PERMISSIONS,
            Role::Admin => &ADMIN_PERMISSIONS,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(Error::msg(format!("Unknown role: {}", s))),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
