use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use sqlx::{Pool, Sqlite};

use crate::auth::{Permission, User};
use crate::db::{
    get_author_with_recipes, get_profile, list_profiles, list_subscriptions, subscribe, unsubscribe,
};
use crate::env::AppConfig;
use crate::models::{AuthorWithRecipes, Profile};
use crate::pagination::{Page, PageRequest};
use crate::validation::{ApiResult, AppErrorExt};

fn recipes_cap(recipes_limit: Option<i64>) -> Option<i64> {
    recipes_limit.filter(|limit| *limit >= 0)
}

#[get("/users?<page>&<limit>")]
pub async fn api_list_users(
    page: Option<i64>,
    limit: Option<i64>,
    viewer: Option<User>,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<Json<Page<Profile>>> {
    let request = PageRequest::new(page, limit, config.users_page_size, config.max_page_size);

    let (profiles, total) = list_profiles(
        db,
        viewer.map(|u| u.id),
        request.limit,
        request.offset(),
    )
    .await
    .validate_custom()?;

    Ok(Json(Page::from_rows(profiles, total, request, "/api/users")))
}

#[get("/users/me")]
pub async fn api_me(user: User, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Profile>> {
    user.require_permission(Permission::ViewOwnProfile)
        .validate_custom()?;

    let profile = get_profile(db, user.id, Some(user.id))
        .await
        .validate_custom()?;

    Ok(Json(profile))
}

#[get("/users/<id>")]
pub async fn api_get_user(
    id: i64,
    viewer: Option<User>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Profile>> {
    let profile = get_profile(db, id, viewer.map(|u| u.id))
        .await
        .validate_custom()?;

    Ok(Json(profile))
}

#[get("/users/subscriptions?<page>&<limit>&<recipes_limit>")]
pub async fn api_list_subscriptions(
    page: Option<i64>,
    limit: Option<i64>,
    recipes_limit: Option<i64>,
    user: User,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<Json<Page<AuthorWithRecipes>>> {
    user.require_permission(Permission::ManageSubscriptions)
        .validate_custom()?;

    let request = PageRequest::new(page, limit, config.page_size, config.max_page_size);
    let recipes_limit = recipes_cap(recipes_limit);

    let (authors, total) = list_subscriptions(
        db,
        user.id,
        request.limit,
        request.offset(),
        recipes_limit,
    )
    .await
    .validate_custom()?;

    let base_path = match recipes_limit {
        Some(cap) => format!("/api/users/subscriptions?recipes_limit={}", cap),
        None => "/api/users/subscriptions".to_string(),
    };

    Ok(Json(Page::from_rows(authors, total, request, &base_path)))
}

#[post("/users/<id>/subscribe?<recipes_limit>")]
pub async fn api_subscribe(
    id: i64,
    recipes_limit: Option<i64>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Custom<Json<AuthorWithRecipes>>> {
    user.require_permission(Permission::ManageSubscriptions)
        .validate_custom()?;

    subscribe(db, user.id, id).await.validate_custom()?;

    let author = get_author_with_recipes(db, id, Some(user.id), recipes_cap(recipes_limit))
        .await
        .validate_custom()?;

    Ok(Custom(Status::Created, Json(author)))
}

/// Succeeds whether or not the subscription existed.
#[delete("/users/<id>/subscribe")]
pub async fn api_unsubscribe(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Status> {
    user.require_permission(Permission::ManageSubscriptions)
        .validate_custom()?;

    let removed = unsubscribe(db, user.id, id).await.validate_custom()?;
    if !removed {
        tracing::info!(author_id = id, "No subscription to remove");
    }

    Ok(Status::NoContent)
}
