use crate::auth::Role;
use crate::db::{create_ingredient, create_recipe, create_tag, create_user, issue_token};
use crate::env::AppConfig;
use crate::error::AppError;
use crate::init_rocket;
use crate::models::{IngredientAmount, RecipePayload};
use rocket::http::Header;
use rocket::local::asynchronous::Client;
use sqlx::{Pool, Sqlite, sqlite::SqlitePoolOptions};
use std::collections::HashMap;
use std::sync::Once;

static INIT: Once = Once::new();

pub const TEST_IMAGE: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

#[derive(Default)]
pub struct TestDbBuilder {
    users: Vec<TestUser>,
    tags: Vec<(String, String)>,
    ingredients: Vec<(String, String)>,
    recipes: Vec<TestRecipe>,
}

pub struct TestUser {
    pub username: String,
    pub role: Role,
}

pub struct TestRecipe {
    pub name: String,
    pub author: String,
    pub cooking_time: i64,
    pub tags: Vec<String>,
    pub ingredients: Vec<(String, i64)>,
}

impl TestDbBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, username: &str) -> Self {
        self.users.push(TestUser {
            username: username.to_string(),
            role: Role::User,
        });
        self
    }

    pub fn admin(mut self, username: &str) -> Self {
        self.users.push(TestUser {
            username: username.to_string(),
            role: Role::Admin,
        });
        self
    }

    pub fn tag(mut self, name: &str, slug: &str) -> Self {
        self.tags.push((name.to_string(), slug.to_string()));
        self
    }

    pub fn ingredient(mut self, name: &str, measurement_unit: &str) -> Self {
        self.ingredients
            .push((name.to_string(), measurement_unit.to_string()));
        self
    }

    /// Tags are referenced by slug, ingredients by name.
    pub fn recipe(
        mut self,
        name: &str,
        author: &str,
        tags: &[&str],
        ingredients: &[(&str, i64)],
    ) -> Self {
        self.recipes.push(TestRecipe {
            name: name.to_string(),
            author: author.to_string(),
            cooking_time: 30,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ingredients: ingredients
                .iter()
                .map(|(name, amount)| (name.to_string(), *amount))
                .collect(),
        });
        self
    }

    pub async fn build(self) -> Result<TestDb, AppError> {
        INIT.call_once(|| {
            let _ = env_logger::builder()
                .parse_filters("debug")
                .is_test(true)
                .try_init();
        });

        let pool = test_pool().await?;

        let mut user_ids = HashMap::new();
        let mut tokens = HashMap::new();
        let mut tag_ids = HashMap::new();
        let mut ingredient_ids = HashMap::new();
        let mut recipe_ids = HashMap::new();

        for user in &self.users {
            let user_id = create_user(
                &pool,
                &format!("{}@example.com", user.username),
                &user.username,
                &capitalize(&user.username),
                "Tester",
                user.role.clone(),
            )
            .await?;

            tokens.insert(user.username.clone(), issue_token(&pool, user_id).await?);
            user_ids.insert(user.username.clone(), user_id);
        }

        for (name, slug) in &self.tags {
            let tag = create_tag(&pool, name, slug).await?;
            tag_ids.insert(slug.clone(), tag.id);
        }

        for (name, unit) in &self.ingredients {
            let ingredient = create_ingredient(&pool, name, unit).await?;
            ingredient_ids.insert(name.clone(), ingredient.id);
        }

        for recipe in &self.recipes {
            let author_id = user_ids
                .get(&recipe.author)
                .copied()
                .ok_or_else(|| AppError::NotFound(format!("No test user {}", recipe.author)))?;

            let payload = RecipePayload {
                name: recipe.name.clone(),
                text: format!("How to cook {}", recipe.name),
                cooking_time: recipe.cooking_time,
                tags: recipe
                    .tags
                    .iter()
                    .map(|slug| tag_ids.get(slug).copied().unwrap_or(-1))
                    .collect(),
                ingredients: recipe
                    .ingredients
                    .iter()
                    .map(|(name, amount)| IngredientAmount {
                        id: ingredient_ids.get(name).copied().unwrap_or(-1),
                        amount: *amount,
                    })
                    .collect(),
                image: Some(TEST_IMAGE.to_string()),
            };

            let recipe_id = create_recipe(&pool, author_id, &payload).await?;
            recipe_ids.insert(recipe.name.clone(), recipe_id);
        }

        Ok(TestDb {
            pool,
            user_ids,
            tokens,
            tag_ids,
            ingredient_ids,
            recipe_ids,
        })
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A single connection keeps the in-memory database alive and shared.
pub async fn test_pool() -> Result<Pool<Sqlite>, AppError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

pub struct TestDb {
    pub pool: Pool<Sqlite>,
    pub user_ids: HashMap<String, i64>,
    pub tokens: HashMap<String, String>,
    pub tag_ids: HashMap<String, i64>,
    pub ingredient_ids: HashMap<String, i64>,
    pub recipe_ids: HashMap<String, i64>,
}

impl TestDb {
    pub fn user_id(&self, username: &str) -> i64 {
        self.user_ids[username]
    }

    pub fn tag_id(&self, slug: &str) -> i64 {
        self.tag_ids[slug]
    }

    pub fn ingredient_id(&self, name: &str) -> i64 {
        self.ingredient_ids[name]
    }

    pub fn recipe_id(&self, name: &str) -> i64 {
        self.recipe_ids[name]
    }

    pub fn auth_header(&self, username: &str) -> Header<'static> {
        Header::new(
            "Authorization",
            format!("Token {}", self.tokens[username]),
        )
    }

    pub async fn count_rows(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

/// Kitchen used by most tests: two cooks, an admin, a small catalog, and
/// three recipes.
pub async fn create_standard_test_db() -> TestDb {
    TestDbBuilder::new()
        .user("alice")
        .user("bob")
        .admin("root")
        .tag("Breakfast", "breakfast")
        .tag("Dinner", "dinner")
        .ingredient("flour", "g")
        .ingredient("sugar", "g")
        .ingredient("milk", "ml")
        .ingredient("eggs", "pcs")
        .recipe(
            "Pancakes",
            "alice",
            &["breakfast"],
            &[("flour", 200), ("sugar", 50), ("milk", 300)],
        )
        .recipe("Bread", "alice", &["dinner"], &[("flour", 100)])
        .recipe(
            "Omelette",
            "bob",
            &["breakfast", "dinner"],
            &[("eggs", 3), ("milk", 50)],
        )
        .build()
        .await
        .expect("Failed to build test database")
}

pub async fn setup_test_client(test_db: TestDb) -> (Client, TestDb) {
    let config = AppConfig::with_database_url("sqlite::memory:");
    let rocket = init_rocket(test_db.pool.clone(), config).await;

    let client = Client::tracked(rocket)
        .await
        .expect("Failed to create test client");

    (client, test_db)
}
