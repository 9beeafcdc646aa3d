use crate::{error::AppError, models::ShoppingListLine};
use sqlx::{Pool, Sqlite};
use tracing::{info, instrument};

/// Sums every carted recipe's composition into one line per
/// (ingredient name, unit), ordered by name then unit.
#[instrument(skip(pool))]
pub async fn compute_shopping_list(
    pool: &Pool<Sqlite>,
    user_id: i64,
) -> Result<Vec<ShoppingListLine>, AppError> {
    info!("Computing shopping list");

    let lines = sqlx::query_as::<_, ShoppingListLine>(
        "SELECT i.name AS name, i.measurement_unit AS measurement_unit,
                SUM(ri.amount) AS total_amount
         FROM shopping_carts sc
         JOIN recipe_ingredients ri ON ri.recipe_id = sc.recipe_id
         JOIN ingredients i ON i.id = ri.ingredient_id
         WHERE sc.user_id = ?
         GROUP BY i.name, i.measurement_unit
         ORDER BY i.name, i.measurement_unit",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    info!(lines = lines.len(), "Shopping list computed");
    Ok(lines)
}
