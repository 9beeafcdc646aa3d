use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::validation::{SLUG_REGEX, encoded_image, ensure_unique, unique_tag_ids};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

/// One composition edge expanded with the ingredient's name and unit.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RecipeIngredient {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub is_subscribed: bool,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbProfile {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar: Option<String>,
    pub is_subscribed: bool,
}

impl From<DbProfile> for Profile {
    fn from(row: DbProfile) -> Self {
        Self {
            id: row.id,
            email: row.email,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            avatar: row.avatar,
            is_subscribed: row.is_subscribed,
        }
    }
}

/// Full read projection of a recipe as seen by one viewer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub text: String,
    pub author: Profile,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredient>,
    pub image: String,
    pub cooking_time: i64,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    #[serde(skip_serializing, default)]
    pub short_url: String,
    #[serde(skip_serializing, default)]
    pub pub_date: Option<NaiveDateTime>,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbRecipe {
    pub id: i64,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i64,
    pub short_url: String,
    pub pub_date: NaiveDateTime,
    pub author_id: i64,
    pub author_email: String,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
    pub author_avatar: Option<String>,
    pub author_is_subscribed: bool,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl DbRecipe {
    pub fn into_recipe(self, tags: Vec<Tag>, ingredients: Vec<RecipeIngredient>) -> Recipe {
        Recipe {
            id: self.id,
            name: self.name,
            text: self.text,
            author: Profile {
                id: self.author_id,
                email: self.author_email,
                username: self.author_username,
                first_name: self.author_first_name,
                last_name: self.author_last_name,
                avatar: self.author_avatar,
                is_subscribed: self.author_is_subscribed,
            },
            tags,
            ingredients,
            image: self.image,
            cooking_time: self.cooking_time,
            is_favorited: self.is_favorited,
            is_in_shopping_cart: self.is_in_shopping_cart,
            short_url: self.short_url,
            pub_date: Some(self.pub_date),
        }
    }
}

/// Minimal projection returned by membership operations and subscriptions.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RecipeMinified {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

/// An author as listed in someone's subscriptions.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthorWithRecipes {
    #[serde(flatten)]
    pub profile: Profile,
    pub recipes_count: i64,
    pub recipes: Vec<RecipeMinified>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ShoppingListLine {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

impl ShoppingListLine {
    pub fn render(&self) -> String {
        format!(
            "{} ({}) — {}",
            self.name, self.measurement_unit, self.total_amount
        )
    }
}

pub fn render_shopping_list(lines: &[ShoppingListLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{}\n", line.render()))
        .collect()
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct IngredientAmount {
    pub id: i64,
    #[validate(range(min = 1, max = 32000, message = "Amount must be between 1 and 32000"))]
    pub amount: i64,
}

/// Inbound recipe body shared by create and update.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct RecipePayload {
    #[serde(default)]
    #[validate(length(min = 1, max = 256, message = "Name must be 1 to 256 characters"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
    #[serde(default)]
    #[validate(range(min = 1, max = 32000, message = "Cooking time must be between 1 and 32000"))]
    pub cooking_time: i64,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "At least one tag is required"),
        custom(function = "unique_tag_ids")
    )]
    pub tags: Vec<i64>,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "At least one ingredient is required"),
        custom(function = "unique_ingredient_ids"),
        nested
    )]
    pub ingredients: Vec<IngredientAmount>,
    #[serde(default)]
    #[validate(custom(function = "encoded_image"))]
    pub image: Option<String>,
}

fn unique_ingredient_ids(ingredients: &[IngredientAmount]) -> Result<(), ValidationError> {
    if ensure_unique(ingredients, |item| item.id) {
        Ok(())
    } else {
        Err(ValidationError::new("unique").with_message("Ingredients must be unique".into()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct TagPayload {
    #[validate(length(min = 1, max = 32, message = "Name must be 1 to 32 characters"))]
    pub name: String,
    #[validate(
        length(min = 1, max = 32, message = "Slug must be 1 to 32 characters"),
        regex(path = *SLUG_REGEX, message = "Slug may only contain letters, digits, '-' and '_'")
    )]
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct IngredientPayload {
    #[validate(length(min = 1, max = 128, message = "Name must be 1 to 128 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 64, message = "Unit must be 1 to 64 characters"))]
    pub measurement_unit: String,
}
