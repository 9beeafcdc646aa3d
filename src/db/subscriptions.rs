use crate::{
    error::AppError,
    models::{AuthorWithRecipes, DbProfile, Profile, RecipeMinified},
};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

use super::get_profile;

#[instrument(skip(pool))]
pub async fn subscribe(pool: &Pool<Sqlite>, user_id: i64, author_id: i64) -> Result<(), AppError> {
    info!("Subscribing to author");

    // 404 for an unknown author takes precedence over the pair checks.
    get_profile(pool, author_id, None).await?;

    if user_id == author_id {
        return Err(AppError::Conflict("Cannot follow self".to_string()));
    }

    let existing = sqlx::query("SELECT id FROM subscriptions WHERE user_id = ? AND author_id = ?")
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Already subscribed".to_string()));
    }

    sqlx::query("INSERT INTO subscriptions (user_id, author_id) VALUES (?, ?)")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Already subscribed"))?;

    Ok(())
}

/// Removes the pair if present. Returns whether a row was deleted.
#[instrument(skip(pool))]
pub async fn unsubscribe(
    pool: &Pool<Sqlite>,
    user_id: i64,
    author_id: i64,
) -> Result<bool, AppError> {
    info!("Unsubscribing from author");

    let res = sqlx::query("DELETE FROM subscriptions WHERE user_id = ? AND author_id = ?")
        .bind(user_id)
        .bind(author_id)
        .execute(pool)
        .await?;

    Ok(res.rows_affected() > 0)
}

/// Newest recipes of an author; `None` means no cap.
#[instrument(skip(pool))]
pub async fn get_author_recipes(
    pool: &Pool<Sqlite>,
    author_id: i64,
    limit: Option<i64>,
) -> Result<Vec<RecipeMinified>, AppError> {
    let recipes = sqlx::query_as::<_, RecipeMinified>(
        "SELECT id, name, image, cooking_time FROM recipes
         WHERE author_id = ?
         ORDER BY pub_date DESC, id DESC
         LIMIT ?",
    )
    .bind(author_id)
    .bind(limit.unwrap_or(-1))
    .fetch_all(pool)
    .await?;

    Ok(recipes)
}

#[instrument(skip(pool))]
pub async fn count_author_recipes(pool: &Pool<Sqlite>, author_id: i64) -> Result<i64, AppError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipes WHERE author_id = ?")
        .bind(author_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

async fn with_recipes(
    pool: &Pool<Sqlite>,
    profile: Profile,
    recipes_limit: Option<i64>,
) -> Result<AuthorWithRecipes, AppError> {
    let recipes_count = count_author_recipes(pool, profile.id).await?;
    let recipes = get_author_recipes(pool, profile.id, recipes_limit).await?;

    Ok(AuthorWithRecipes {
        profile,
        recipes_count,
        recipes,
    })
}

#[instrument(skip(pool))]
pub async fn get_author_with_recipes(
    pool: &Pool<Sqlite>,
    author_id: i64,
    viewer: Option<i64>,
    recipes_limit: Option<i64>,
) -> Result<AuthorWithRecipes, AppError> {
    let profile = get_profile(pool, author_id, viewer).await?;
    with_recipes(pool, profile, recipes_limit).await
}

/// Authors followed by `user_id`, one page at a time, ordered by username.
#[instrument(skip(pool))]
pub async fn list_subscriptions(
    pool: &Pool<Sqlite>,
    user_id: i64,
    limit: i64,
    offset: i64,
    recipes_limit: Option<i64>,
) -> Result<(Vec<AuthorWithRecipes>, i64), AppError> {
    info!("Listing subscriptions");

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscriptions WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as::<_, DbProfile>(
        "SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.avatar,
                1 AS is_subscribed
         FROM subscriptions s
         JOIN users u ON u.id = s.author_id
         WHERE s.user_id = ?
         ORDER BY u.username
         LIMIT ? OFFSET ?",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let mut authors = Vec::with_capacity(rows.len());
    for row in rows {
        authors.push(with_recipes(pool, Profile::from(row), recipes_limit).await?);
    }

    Ok((authors, total))
}
