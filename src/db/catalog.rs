use crate::{
    error::AppError,
    models::{Ingredient, Tag},
};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

#[instrument]
pub async fn get_all_tags(pool: &Pool<Sqlite>) -> Result<Vec<Tag>, AppError> {
    info!("Getting all tags");
    let tags = sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(tags)
}

#[instrument]
pub async fn get_tag(pool: &Pool<Sqlite>, id: i64) -> Result<Tag, AppError> {
    info!("Getting tag");
    sqlx::query_as::<_, Tag>("SELECT id, name, slug FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Tag with id {} not found", id)))
}

#[instrument]
pub async fn create_tag(pool: &Pool<Sqlite>, name: &str, slug: &str) -> Result<Tag, AppError> {
    info!("Creating tag");

    let existing = sqlx::query("SELECT id FROM tags WHERE name = ? OR slug = ?")
        .bind(name)
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "Tag with this name or slug already exists".to_string(),
        ));
    }

    let res = sqlx::query("INSERT INTO tags (name, slug) VALUES (?, ?)")
        .bind(name)
        .bind(slug)
        .execute(pool)
        .await
        .map_err(|e| AppError::conflict_on_unique(e, "Tag with this name or slug already exists"))?;

    Ok(Tag {
        id: res.last_insert_rowid(),
        name: name.to_string(),
        slug: slug.to_string(),
    })
}

/// Case-insensitive prefix search; `None` lists the whole catalog.
#[instrument]
pub async fn search_ingredients(
    pool: &Pool<Sqlite>,
    name_prefix: Option<&str>,
) -> Result<Vec<Ingredient>, AppError> {
    info!("Searching ingredients");

    let ingredients = match name_prefix.map(str::trim).filter(|p| !p.is_empty()) {
        Some(prefix) => {
            let pattern = format!("{}%", escape_like(&prefix.to_lowercase()));
            sqlx::query_as::<_, Ingredient>(
                "SELECT id, name, measurement_unit FROM ingredients
                 WHERE name_lower LIKE ? ESCAPE '\\'
                 ORDER BY name",
            )
            .bind(pattern)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as::<_, Ingredient>(
                "SELECT id, name, measurement_unit FROM ingredients ORDER BY name",
            )
            .fetch_all(pool)
            .await?
        }
    };

    Ok(ingredients)
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[instrument]
pub async fn get_ingredient(pool: &Pool<Sqlite>, id: i64) -> Result<Ingredient, AppError> {
    info!("Getting ingredient");
    sqlx::query_as::<_, Ingredient>(
        "SELECT id, name, measurement_unit FROM ingredients WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Ingredient with id {} not found", id)))
}

#[instrument]
pub async fn create_ingredient(
    pool: &Pool<Sqlite>,
    name: &str,
    measurement_unit: &str,
) -> Result<Ingredient, AppError> {
    info!("Creating ingredient");

    let res = sqlx::query(
        "INSERT INTO ingredients (name, name_lower, measurement_unit) VALUES (?, ?, ?)",
    )
    .bind(name)
    .bind(name.to_lowercase())
    .bind(measurement_unit)
    .execute(pool)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Ingredient with this name already exists"))?;

    Ok(Ingredient {
        id: res.last_insert_rowid(),
        name: name.to_string(),
        measurement_unit: measurement_unit.to_string(),
    })
}
