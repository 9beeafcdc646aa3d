use crate::{
    auth::{DbUser, Role, User},
    error::AppError,
    models::{DbProfile, Profile},
};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};
use uuid::Uuid;

const PROFILE_SELECT: &str = "SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.avatar,
        EXISTS(SELECT 1 FROM subscriptions s WHERE s.user_id = ? AND s.author_id = u.id) AS is_subscribed
     FROM users u";

#[instrument]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>(
        "SELECT id, email, username, first_name, last_name, avatar, role FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument(skip(pool, token))]
pub async fn get_user_by_token(pool: &Pool<Sqlite>, token: &str) -> Result<User, AppError> {
    info!("Resolving user by auth token");
    let row = sqlx::query_as::<_, DbUser>(
        "SELECT u.id, u.email, u.username, u.first_name, u.last_name, u.avatar, u.role
         FROM auth_tokens t
         JOIN users u ON u.id = t.user_id
         WHERE t.key = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::Authentication("Invalid token".to_string())),
    }
}

#[instrument(skip(pool))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    email: &str,
    username: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
) -> Result<i64, AppError> {
    info!("Creating new user");

    let res = sqlx::query(
        "INSERT INTO users (email, username, first_name, last_name, role) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(email)
    .bind(username)
    .bind(first_name)
    .bind(last_name)
    .bind(role.as_str())
    .execute(pool)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "User with this email or username already exists"))?;

    Ok(res.last_insert_rowid())
}

/// Stores a fresh API token for the user and returns its key.
#[instrument(skip(pool))]
pub async fn issue_token(pool: &Pool<Sqlite>, user_id: i64) -> Result<String, AppError> {
    info!("Issuing auth token");
    let key = Uuid::new_v4().simple().to_string();

    sqlx::query("INSERT INTO auth_tokens (key, user_id) VALUES (?, ?)")
        .bind(&key)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(key)
}

#[instrument]
pub async fn get_profile(
    pool: &Pool<Sqlite>,
    id: i64,
    viewer: Option<i64>,
) -> Result<Profile, AppError> {
    info!("Fetching user profile");
    let row = sqlx::query_as::<_, DbProfile>(&format!("{} WHERE u.id = ?", PROFILE_SELECT))
        .bind(viewer)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(profile) => Ok(Profile::from(profile)),
        _ => Err(AppError::NotFound(format!("User with id {} not found", id))),
    }
}

#[instrument]
pub async fn list_profiles(
    pool: &Pool<Sqlite>,
    viewer: Option<i64>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Profile>, i64), AppError> {
    info!("Listing user profiles");
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as::<_, DbProfile>(&format!(
        "{} ORDER BY u.username LIMIT ? OFFSET ?",
        PROFILE_SELECT
    ))
    .bind(viewer)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((rows.into_iter().map(Profile::from).collect(), total))
}
