use rocket::State;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use sqlx::{Pool, Sqlite};

use crate::auth::{Permission, User};
use crate::db::{
    create_ingredient, create_tag, get_all_tags, get_ingredient, get_tag, search_ingredients,
};
use crate::models::{Ingredient, IngredientPayload, Tag, TagPayload};
use crate::validation::{ApiResult, AppErrorExt, JsonValidateExt};

#[get("/tags")]
pub async fn api_get_all_tags(db: &State<Pool<Sqlite>>) -> ApiResult<Json<Vec<Tag>>> {
    let tags = get_all_tags(db).await.validate_custom()?;
    Ok(Json(tags))
}

#[get("/tags/<id>")]
pub async fn api_get_tag(id: i64, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Tag>> {
    let tag = get_tag(db, id).await.validate_custom()?;
    Ok(Json(tag))
}

#[post("/tags", data = "<request>")]
pub async fn api_create_tag(
    request: Json<TagPayload>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Custom<Json<Tag>>> {
    user.require_permission(Permission::ManageCatalog)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    let tag = create_tag(db, &validated.name, &validated.slug)
        .await
        .validate_custom()?;

    Ok(Custom(Status::Created, Json(tag)))
}

#[get("/ingredients?<name>")]
pub async fn api_search_ingredients(
    name: Option<&str>,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Json<Vec<Ingredient>>> {
    let ingredients = search_ingredients(db, name).await.validate_custom()?;
    Ok(Json(ingredients))
}

#[get("/ingredients/<id>")]
pub async fn api_get_ingredient(id: i64, db: &State<Pool<Sqlite>>) -> ApiResult<Json<Ingredient>> {
    let ingredient = get_ingredient(db, id).await.validate_custom()?;
    Ok(Json(ingredient))
}

#[post("/ingredients", data = "<request>")]
pub async fn api_create_ingredient(
    request: Json<IngredientPayload>,
    user: User,
    db: &State<Pool<Sqlite>>,
) -> ApiResult<Custom<Json<Ingredient>>> {
    user.require_permission(Permission::ManageCatalog)
        .validate_custom()?;

    let validated = request.validate_custom()?;

    let ingredient = create_ingredient(db, &validated.name, &validated.measurement_unit)
        .await
        .validate_custom()?;

    Ok(Custom(Status::Created, Json(ingredient)))
}
