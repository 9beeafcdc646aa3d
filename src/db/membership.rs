use crate::{error::AppError, models::RecipeMinified};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use super::recipe_exists;

/// The two (user, recipe) sets a viewer can put recipes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Favorite,
    ShoppingCart,
}

impl Membership {
    fn table(&self) -> &'static str {
        match self {
            Membership::Favorite => "favorites",
            Membership::ShoppingCart => "shopping_carts",
        }
    }

    fn already_added(&self) -> &'static str {
        match self {
            Membership::Favorite => "Recipe is already in favorites",
            Membership::ShoppingCart => "Recipe is already in the shopping cart",
        }
    }

    fn not_added(&self) -> &'static str {
        match self {
            Membership::Favorite => "Recipe is not in favorites",
            Membership::ShoppingCart => "Recipe is not in the shopping cart",
        }
    }
}

#[instrument(skip(pool))]
pub async fn get_recipe_minified(
    pool: &Pool<Sqlite>,
    recipe_id: i64,
) -> Result<RecipeMinified, AppError> {
    sqlx::query_as::<_, RecipeMinified>(
        "SELECT id, name, image, cooking_time FROM recipes WHERE id = ?",
    )
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Recipe with id {} not found", recipe_id)))
}

#[instrument(skip(pool))]
pub async fn is_member(
    pool: &Pool<Sqlite>,
    membership: Membership,
    user_id: i64,
    recipe_id: i64,
) -> Result<bool, AppError> {
    let row = sqlx::query(&format!(
        "SELECT id FROM {} WHERE user_id = ? AND recipe_id = ?",
        membership.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.is_some())
}

/// Adds the pair or fails with `Conflict`. The existence check only gives a
/// fast answer; the unique constraint decides races.
#[instrument(skip(pool))]
pub async fn add_membership(
    pool: &Pool<Sqlite>,
    membership: Membership,
    user_id: i64,
    recipe_id: i64,
) -> Result<RecipeMinified, AppError> {
    info!("Adding recipe to membership set");

    let recipe = get_recipe_minified(pool, recipe_id).await?;

    if is_member(pool, membership, user_id, recipe_id).await? {
        return Err(AppError::Conflict(membership.already_added().to_string()));
    }

    sqlx::query(&format!(
        "INSERT INTO {} (user_id, recipe_id) VALUES (?, ?)",
        membership.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, membership.already_added()))?;

    Ok(recipe)
}

#[instrument(skip(pool))]
pub async fn remove_membership(
    pool: &Pool<Sqlite>,
    membership: Membership,
    user_id: i64,
    recipe_id: i64,
) -> Result<(), AppError> {
    info!("Removing recipe from membership set");

    if !recipe_exists(pool, recipe_id).await? {
        return Err(AppError::NotFound(format!(
            "Recipe with id {} not found",
            recipe_id
        )));
    }

    let res = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = ? AND recipe_id = ?",
        membership.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(membership.not_added().to_string()));
    }

    Ok(())
}
