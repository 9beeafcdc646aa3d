use crate::{
    error::AppError,
    models::{DbRecipe, Recipe, RecipeIngredient, RecipePayload, Tag},
};
use chrono::Utc;
use rand::{Rng, distr::Alphanumeric};
use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};
use tracing::{info, instrument, warn};

pub const SHORT_URL_LENGTH: usize = 8;
const SHORT_URL_ATTEMPTS: usize = 5;

/// Narrowing options for the recipe list. Viewer-relative flags are ignored
/// or collapse to an empty result for anonymous viewers.
#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub author: Option<i64>,
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

pub fn generate_short_url() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SHORT_URL_LENGTH)
        .map(char::from)
        .collect()
}

async fn unused_short_url(conn: &mut SqliteConnection) -> Result<String, AppError> {
    for _ in 0..SHORT_URL_ATTEMPTS {
        let candidate = generate_short_url();
        let taken = sqlx::query("SELECT id FROM recipes WHERE short_url = ?")
            .bind(&candidate)
            .fetch_optional(&mut *conn)
            .await?;

        if taken.is_none() {
            return Ok(candidate);
        }
        warn!(short_url = %candidate, "Short URL collision, regenerating");
    }

    Err(AppError::Internal(
        "Could not allocate a unique short URL".to_string(),
    ))
}

/// Every referenced ingredient and tag has to exist; the first missing id is
/// reported against its field.
async fn ensure_references(
    conn: &mut SqliteConnection,
    payload: &RecipePayload,
) -> Result<(), AppError> {
    for item in &payload.ingredients {
        let found = sqlx::query("SELECT id FROM ingredients WHERE id = ?")
            .bind(item.id)
            .fetch_optional(&mut *conn)
            .await?;

        if found.is_none() {
            return Err(AppError::validation(
                "ingredients",
                format!("Ingredient with id {} does not exist", item.id),
            ));
        }
    }

    for tag_id in &payload.tags {
        let found = sqlx::query("SELECT id FROM tags WHERE id = ?")
            .bind(tag_id)
            .fetch_optional(&mut *conn)
            .await?;

        if found.is_none() {
            return Err(AppError::validation(
                "tags",
                format!("Tag with id {} does not exist", tag_id),
            ));
        }
    }

    Ok(())
}

fn ensure_composition_present(payload: &RecipePayload) -> Result<(), AppError> {
    if payload.tags.is_empty() {
        return Err(AppError::validation("tags", "At least one tag is required"));
    }
    if payload.ingredients.is_empty() {
        return Err(AppError::validation(
            "ingredients",
            "At least one ingredient is required",
        ));
    }
    Ok(())
}

/// Inserts the tag links and composition rows for a recipe that currently
/// has none.
async fn write_composition(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    payload: &RecipePayload,
) -> Result<(), AppError> {
    let mut tags: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    tags.push_values(payload.tags.iter(), |mut row, tag_id| {
        row.push_bind(recipe_id).push_bind(*tag_id);
    });
    tags.build()
        .execute(&mut *conn)
        .await
        .map_err(|e| match AppError::conflict_on_unique(e, "") {
            AppError::Conflict(_) => AppError::validation("tags", "Tags must be unique"),
            other => other,
        })?;

    let mut ingredients: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    ingredients.push_values(payload.ingredients.iter(), |mut row, item| {
        row.push_bind(recipe_id)
            .push_bind(item.id)
            .push_bind(item.amount);
    });
    ingredients
        .build()
        .execute(&mut *conn)
        .await
        .map_err(|e| match AppError::conflict_on_unique(e, "") {
            AppError::Conflict(_) => {
                AppError::validation("ingredients", "Ingredients must be unique")
            }
            other => other,
        })?;

    Ok(())
}

/// Creates the recipe row, its tag set and its composition in one
/// transaction. The image is mandatory here.
#[instrument(skip(pool, payload), fields(recipe_name = %payload.name))]
pub async fn create_recipe(
    pool: &Pool<Sqlite>,
    author_id: i64,
    payload: &RecipePayload,
) -> Result<i64, AppError> {
    info!("Creating recipe");

    let Some(image) = payload.image.as_deref() else {
        return Err(AppError::validation("image", "Image is required"));
    };
    ensure_composition_present(payload)?;

    let mut tx = pool.begin().await?;

    ensure_references(&mut tx, payload).await?;
    let short_url = unused_short_url(&mut tx).await?;

    let res = sqlx::query(
        "INSERT INTO recipes (author_id, name, text, cooking_time, pub_date, image, short_url)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(author_id)
    .bind(&payload.name)
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .bind(Utc::now().naive_utc())
    .bind(image)
    .bind(&short_url)
    .execute(&mut *tx)
    .await?;

    let recipe_id = res.last_insert_rowid();

    write_composition(&mut tx, recipe_id, payload).await?;

    tx.commit().await?;

    info!(recipe_id, "Recipe created");
    Ok(recipe_id)
}

/// Replaces scalar fields, the tag set and the whole composition. The image
/// is kept when the payload leaves it out.
#[instrument(skip(pool, payload))]
pub async fn update_recipe(
    pool: &Pool<Sqlite>,
    recipe_id: i64,
    payload: &RecipePayload,
) -> Result<(), AppError> {
    info!("Updating recipe");

    ensure_composition_present(payload)?;

    let mut tx = pool.begin().await?;

    ensure_references(&mut tx, payload).await?;

    let res = sqlx::query(
        "UPDATE recipes
         SET name = ?, text = ?, cooking_time = ?, image = COALESCE(?, image)
         WHERE id = ?",
    )
    .bind(&payload.name)
    .bind(&payload.text)
    .bind(payload.cooking_time)
    .bind(payload.image.as_deref())
    .bind(recipe_id)
    .execute(&mut *tx)
    .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Recipe with id {} not found",
            recipe_id
        )));
    }

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

    write_composition(&mut tx, recipe_id, payload).await?;

    tx.commit().await?;

    Ok(())
}

/// Deletes a recipe together with every row that references it.
#[instrument(skip(pool))]
pub async fn delete_recipe(pool: &Pool<Sqlite>, recipe_id: i64) -> Result<(), AppError> {
    info!("Deleting recipe");

    let mut tx = pool.begin().await?;

    for table in [
        "recipe_ingredients",
        "recipe_tags",
        "favorites",
        "shopping_carts",
    ] {
        sqlx::query(&format!("DELETE FROM {} WHERE recipe_id = ?", table))
            .bind(recipe_id)
            .execute(&mut *tx)
            .await?;
    }

    let res = sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::NotFound(format!(
            "Recipe with id {} not found",
            recipe_id
        )));
    }

    tx.commit().await?;

    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_recipe_author_id(pool: &Pool<Sqlite>, recipe_id: i64) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT author_id FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe with id {} not found", recipe_id)))
}

#[instrument(skip(pool))]
pub async fn recipe_exists(pool: &Pool<Sqlite>, recipe_id: i64) -> Result<bool, AppError> {
    let row = sqlx::query("SELECT id FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.is_some())
}

#[instrument(skip(pool))]
pub async fn get_short_url(pool: &Pool<Sqlite>, recipe_id: i64) -> Result<String, AppError> {
    sqlx::query_scalar::<_, String>("SELECT short_url FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe with id {} not found", recipe_id)))
}

#[instrument(skip(pool))]
pub async fn find_recipe_by_short_url(
    pool: &Pool<Sqlite>,
    short_url: &str,
) -> Result<i64, AppError> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM recipes WHERE short_url = ?")
        .bind(short_url)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No recipe for short link {}", short_url)))
}

#[instrument(skip(pool))]
pub async fn get_recipe_tags(pool: &Pool<Sqlite>, recipe_id: i64) -> Result<Vec<Tag>, AppError> {
    let tags = sqlx::query_as::<_, Tag>(
        "SELECT t.id, t.name, t.slug
         FROM recipe_tags rt
         JOIN tags t ON t.id = rt.tag_id
         WHERE rt.recipe_id = ?
         ORDER BY t.name",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(tags)
}

#[instrument(skip(pool))]
pub async fn get_composition(
    pool: &Pool<Sqlite>,
    recipe_id: i64,
) -> Result<Vec<RecipeIngredient>, AppError> {
    let rows = sqlx::query_as::<_, RecipeIngredient>(
        "SELECT i.id, i.name, i.measurement_unit, ri.amount
         FROM recipe_ingredients ri
         JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE ri.recipe_id = ?
         ORDER BY ri.id",
    )
    .bind(recipe_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

fn push_recipe_select(builder: &mut QueryBuilder<'_, Sqlite>, viewer: Option<i64>) {
    builder.push(
        "SELECT r.id, r.name, r.text, r.image, r.cooking_time, r.short_url, r.pub_date,
            u.id AS author_id, u.email AS author_email, u.username AS author_username,
            u.first_name AS author_first_name, u.last_name AS author_last_name,
            u.avatar AS author_avatar,
            EXISTS(SELECT 1 FROM subscriptions s WHERE s.author_id = u.id AND s.user_id = ",
    );
    builder.push_bind(viewer);
    builder.push(
        ") AS author_is_subscribed,
            EXISTS(SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ",
    );
    builder.push_bind(viewer);
    builder.push(
        ") AS is_favorited,
            EXISTS(SELECT 1 FROM shopping_carts c WHERE c.recipe_id = r.id AND c.user_id = ",
    );
    builder.push_bind(viewer);
    builder.push(
        ") AS is_in_shopping_cart
         FROM recipes r
         JOIN users u ON u.id = r.author_id",
    );
}

fn push_recipe_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    filter: &RecipeFilter,
    viewer: Option<i64>,
) {
    builder.push(" WHERE 1 = 1");

    if let Some(author) = filter.author {
        builder.push(" AND r.author_id = ");
        builder.push_bind(author);
    }

    if !filter.tags.is_empty() {
        builder.push(
            " AND r.id IN (SELECT rt.recipe_id FROM recipe_tags rt
               JOIN tags t ON t.id = rt.tag_id WHERE t.slug IN (",
        );
        let mut slugs = builder.separated(", ");
        for slug in &filter.tags {
            slugs.push_bind(slug.clone());
        }
        slugs.push_unseparated("))");
    }

    if let (Some(true), Some(user_id)) = (filter.is_favorited, viewer) {
        builder.push(" AND r.id IN (SELECT recipe_id FROM favorites WHERE user_id = ");
        builder.push_bind(user_id);
        builder.push(")");
    }

    match (filter.is_in_shopping_cart, viewer) {
        (None, _) => {}
        (Some(_), None) => {
            builder.push(" AND 0");
        }
        (Some(in_cart), Some(user_id)) => {
            builder.push(if in_cart {
                " AND r.id IN (SELECT recipe_id FROM shopping_carts WHERE user_id = "
            } else {
                " AND r.id NOT IN (SELECT recipe_id FROM shopping_carts WHERE user_id = "
            });
            builder.push_bind(user_id);
            builder.push(")");
        }
    }
}

async fn expand(pool: &Pool<Sqlite>, row: DbRecipe) -> Result<Recipe, AppError> {
    let tags = get_recipe_tags(pool, row.id).await?;
    let ingredients = get_composition(pool, row.id).await?;
    Ok(row.into_recipe(tags, ingredients))
}

/// Full projection of one recipe relative to `viewer`.
#[instrument(skip(pool))]
pub async fn get_recipe(
    pool: &Pool<Sqlite>,
    recipe_id: i64,
    viewer: Option<i64>,
) -> Result<Recipe, AppError> {
    info!("Getting recipe");

    let mut builder = QueryBuilder::new("");
    push_recipe_select(&mut builder, viewer);
    builder.push(" WHERE r.id = ");
    builder.push_bind(recipe_id);

    let row = builder
        .build_query_as::<DbRecipe>()
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe with id {} not found", recipe_id)))?;

    expand(pool, row).await
}

/// One page of recipes, newest first, plus the total matching count.
#[instrument(skip(pool))]
pub async fn list_recipes(
    pool: &Pool<Sqlite>,
    filter: &RecipeFilter,
    viewer: Option<i64>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Recipe>, i64), AppError> {
    info!("Listing recipes");

    let mut count: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM recipes r JOIN users u ON u.id = r.author_id");
    push_recipe_filters(&mut count, filter, viewer);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut builder = QueryBuilder::new("");
    push_recipe_select(&mut builder, viewer);
    push_recipe_filters(&mut builder, filter, viewer);
    builder.push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ");
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(offset);

    let rows = builder.build_query_as::<DbRecipe>().fetch_all(pool).await?;

    let mut recipes = Vec::with_capacity(rows.len());
    for row in rows {
        recipes.push(expand(pool, row).await?);
    }

    Ok((recipes, total))
}
