use rocket::http::Status;
use serde::Serialize;

use super::{Permission, Role};

#[derive(Debug, Serialize, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub role: Role,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub role: String,
}

impl From<DbUser> for User {
    fn from(user: DbUser) -> Self {
        let role = Role::parse(&user.role).unwrap_or_else(|err| {
            tracing::warn!(user_id = user.id, error = %err, "Falling back to the user role");
            Role::User
        });

        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar: user.avatar,
            role,
        }
    }
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.role.has_permission(permission)
    }

    pub fn require_permission(&self, permission: Permission) -> Result<(), Status> {
        if self.role.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(
                username = %self.username,
                role = %self.role.as_str(),
                permission = ?permission,
                "Permission denied"
            );
            Err(Status::Forbidden)
        }
    }

    /// Owners may change their own recipes; `ManageAllRecipes` covers the rest.
    pub fn require_recipe_owner(&self, author_id: i64) -> Result<(), Status> {
        if self.id == author_id {
            self.require_permission(Permission::ManageOwnRecipes)
        } else {
            self.require_permission(Permission::ManageAllRecipes)
        }
    }
}
