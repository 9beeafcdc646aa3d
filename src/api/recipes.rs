use rocket::{FromForm, Responder, State};
use rocket::http::{Header, RawStr, Status};
use rocket::response::Redirect;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde_json::{Value, json};
use sqlx::{Pool, Sqlite};

use crate::auth::{Permission, User};
use crate::db::{
    Membership, RecipeFilter, add_membership, compute_shopping_list, create_recipe, delete_recipe,
    find_recipe_by_short_url, get_recipe, get_recipe_author_id, get_short_url, list_recipes,
    remove_membership, update_recipe,
};
use crate::env::AppConfig;
use crate::error::AppError;
use crate::models::{Recipe, RecipeMinified, RecipePayload, render_shopping_list};
use crate::pagination::{Page, PageRequest};
use crate::validation::{ApiResult, AppErrorExt, JsonValidateExt};

pub const SHOPPING_LIST_FILENAME: &str = "shopping_cart.txt";

#[derive(FromForm, Debug, Default)]
pub struct RecipeQueryParams {
    page: Option<i64>,
    limit: Option<i64>,
    author: Option<i64>,
    tags: Vec<String>,
    is_favorited: Option<i64>,
    is_in_shopping_cart: Option<i64>,
}

impl RecipeQueryParams {
    fn filter(&self) -> RecipeFilter {
        RecipeFilter {
            author: self.author,
            tags: self.tags.clone(),
            is_favorited: self.is_favorited.map(|v| v != 0),
            is_in_shopping_cart: self.is_in_shopping_cart.map(|v| v != 0),
        }
    }

    /// List URL carrying the active filters, used for `next`/`previous`.
    fn base_path(&self) -> String {
        let mut params = Vec::new();

        if let Some(author) = self.author {
            params.push(format!("author={}", author));
        }
        for tag in &self.tags {
            params.push(format!("tags={}", RawStr::new(tag).percent_encode().as_str()));
        }
        if let Some(flag) = self.is_favorited {
            params.push(format!("is_favorited={}", flag));
        }
        if let Some(flag) = self.is_in_shopping_cart {
            params.push(format!("is_in_shopping_cart={}", flag));
        }

        if params.is_empty() {
            "/api/recipes".to_string()
        } else {
            format!("/api/recipes?{}", params.join("&"))
        }
    }
}

#[get("/recipes?<params..>")]
pub async fn api_list_recipes(
    params: RecipeQueryParams,
    viewer: Option<User>,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> ApiResult<Json<Page<Recipe>>> {
    let request = PageRequest::new(
        params.page,
        params.limit,
        config.page_size,
        config.max_page_size,
    );
    let viewer_id = viewer.map(|u| u.id);

    let (recipes, total) = list_recipes(
        db,
        &params.filter(),
        viewer_id,
        request.limit,
        request.offset(),
    )
    .await
    .validate_custom()?;

    Ok(Json(Page::from_rows(
        recipes,
        total,
        request,
        &params.base_path(),
    )))
}

#[post("/recipes", data = "<payload>")]
pub async fn api_create_recipe(
    payload: Json<RecipePayload>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Custom<Json<Recipe>>> {
    user.require_permission(Permission::AuthorRecipes)
        .validate_custom()?;

    let payload = payload.validate_custom()?;

    let recipe_id = create_recipe(db, user.id, &payload)
        .await
        .validate_custom()?;
    let recipe = get_recipe(db, recipe_id, Some(user.id))
        .await
        .validate_custom()?;

    Ok(Custom(Status::Created, Json(recipe)))
}

#[get("/recipes/<id>")]
pub async fn api_get_recipe(
    id: i64,
    viewer: Option<User>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Recipe>> {
    let recipe = get_recipe(db, id, viewer.map(|u| u.id))
        .await
        .validate_custom()?;

    Ok(Json(recipe))
}

#[patch("/recipes/<id>", data = "<payload>")]
pub async fn api_update_recipe(
    id: i64,
    payload: Json<RecipePayload>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Recipe>> {
    let author_id = get_recipe_author_id(db, id).await.validate_custom()?;
    user.require_recipe_owner(author_id).validate_custom()?;

    let payload = payload.validate_custom()?;

    update_recipe(db, id, &payload).await.validate_custom()?;
    let recipe = get_recipe(db, id, Some(user.id)).await.validate_custom()?;

    Ok(Json(recipe))
}

#[delete("/recipes/<id>")]
pub async fn api_delete_recipe(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Status> {
    let author_id = get_recipe_author_id(db, id).await.validate_custom()?;
    user.require_recipe_owner(author_id).validate_custom()?;

    delete_recipe(db, id).await.validate_custom()?;

    Ok(Status::NoContent)
}

#[get("/recipes/<id>/get-link")]
pub async fn api_get_short_link(id: i64, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Value>> {
    let short_url = get_short_url(db, id).await.validate_custom()?;

    Ok(Json(json!({ "short-link": short_url })))
}

#[get("/s/<token>")]
pub async fn follow_short_link(
    token: &str,
    db: &State<Pool<Sqlite>>,
) -> Result<Redirect, AppError> {
    let recipe_id = find_recipe_by_short_url(db, token).await?;

    Ok(Redirect::to(format!("/recipes/{}", recipe_id)))
}

async fn add_to(
    db: &Pool<Sqlite>,
    user: &User,
    membership: Membership,
    permission: Permission,
    recipe_id: i64,
) -> ApiResult<Custom<Json<RecipeMinified>>> {
    user.require_permission(permission).validate_custom()?;

    let recipe = add_membership(db, membership, user.id, recipe_id)
        .await
        .validate_custom()?;

    Ok(Custom(Status::Created, Json(recipe)))
}

async fn remove_from(
    db: &Pool<Sqlite>,
    user: &User,
    membership: Membership,
    permission: Permission,
    recipe_id: i64,
) -> ApiResult<Status> {
    user.require_permission(permission).validate_custom()?;

    remove_membership(db, membership, user.id, recipe_id)
        .await
        .validate_custom()?;

    Ok(Status::NoContent)
}

#[post("/recipes/<id>/favorite")]
pub async fn api_add_favorite(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Custom<Json<RecipeMinified>>> {
    add_to(db, &user, Membership::Favorite, Permission::ManageFavorites, id).await
}

#[delete("/recipes/<id>/favorite")]
pub async fn api_remove_favorite(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Status> {
    remove_from(db, &user, Membership::Favorite, Permission::ManageFavorites, id).await
}

#[post("/recipes/<id>/shopping_cart")]
pub async fn api_add_to_shopping_cart(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Custom<Json<RecipeMinified>>> {
    add_to(
        db,
        &user,
        Membership::ShoppingCart,
        Permission::ManageShoppingCart,
        id,
    )
    .await
}

#[delete("/recipes/<id>/shopping_cart")]
pub async fn api_remove_from_shopping_cart(
    id: i64,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Status> {
    remove_from(
        db,
        &user,
        Membership::ShoppingCart,
        Permission::ManageShoppingCart,
        id,
    )
    .await
}

#[derive(Responder)]
pub struct ShoppingListAttachment {
    body: String,
    disposition: Header<'static>,
}

impl ShoppingListAttachment {
    fn new(body: String) -> Self {
        Self {
            body,
            disposition: Header::new(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", SHOPPING_LIST_FILENAME),
            ),
        }
    }
}

#[get("/recipes/download_shopping_cart")]
pub async fn api_download_shopping_cart(
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<ShoppingListAttachment> {
    user.require_permission(Permission::ManageShoppingCart)
        .validate_custom()?;

    let lines = compute_shopping_list(db, user.id).await.validate_custom()?;

    Ok(ShoppingListAttachment::new(render_shopping_list(&lines)))
}
