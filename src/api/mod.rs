pub mod catalog;
pub mod recipes;
pub mod users;

use rocket::Route;

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}

/// Every JSON endpoint, mounted under `/api`.
pub fn routes() -> Vec<Route> {
    routes![
        health,
        catalog::api_get_all_tags,
        catalog::api_get_tag,
        catalog::api_create_tag,
        catalog::api_search_ingredients,
        catalog::api_get_ingredient,
        catalog::api_create_ingredient,
        recipes::api_list_recipes,
        recipes::api_create_recipe,
        recipes::api_get_recipe,
        recipes::api_update_recipe,
        recipes::api_delete_recipe,
        recipes::api_get_short_link,
        recipes::api_add_favorite,
        recipes::api_remove_favorite,
        recipes::api_add_to_shopping_cart,
        recipes::api_remove_from_shopping_cart,
        recipes::api_download_shopping_cart,
        users::api_list_users,
        users::api_me,
        users::api_get_user,
        users::api_list_subscriptions,
        users::api_subscribe,
        users::api_unsubscribe,
    ]
}
