//! JSON bodies returned by the API.
use serde::Serialize;

use crate::{
    database::queries::{FollowedAuthor, RecipeDetails, RecipeIngredientRow},
    domain::media_url,
    models::{RecipeSummary, Tag, User},
};

#[derive(Serialize, Debug)]
pub struct UserRepresentation {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserRepresentation {
    pub fn new(user: User, is_subscribed: bool) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

/// The body of a successful sign-up. Never carries the password.
#[derive(Serialize, Debug)]
pub struct RegisteredUser {
    pub email: String,
    pub id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for RegisteredUser {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct TokenResponse {
    pub auth_token: String,
}

#[derive(Serialize, Debug)]
pub struct IngredientInRecipe {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipeIngredientRow> for IngredientInRecipe {
    fn from(row: RecipeIngredientRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            measurement_unit: row.measurement_unit,
            amount: row.amount,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct RecipeRepresentation {
    pub id: i32,
    pub tags: Vec<Tag>,
    pub author: UserRepresentation,
    pub ingredients: Vec<IngredientInRecipe>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

impl RecipeRepresentation {
    pub fn new(details: RecipeDetails, base_url: &str) -> Self {
        Self {
            id: details.recipe.id,
            tags: details.tags,
            author: UserRepresentation::new(
                details.author,
                details.author_subscribed,
            ),
            ingredients: details.ingredients.into_iter().map(Into::into).collect(),
            is_favorited: details.is_favorited,
            is_in_shopping_cart: details.is_in_shopping_cart,
            name: details.recipe.name,
            image: media_url(base_url, &details.recipe.image),
            text: details.recipe.text,
            cooking_time: details.recipe.cooking_time,
        }
    }
}

/// The short form used for list membership and subscriptions.
#[derive(Serialize, Debug)]
pub struct RecipeSummaryRepresentation {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl RecipeSummaryRepresentation {
    pub fn new(recipe: RecipeSummary, base_url: &str) -> Self {
        Self {
            id: recipe.id,
            image: media_url(base_url, &recipe.image),
            name: recipe.name,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct SubscriptionRepresentation {
    #[serde(flatten)]
    pub author: UserRepresentation,
    pub recipes: Vec<RecipeSummaryRepresentation>,
    pub recipes_count: usize,
}

impl SubscriptionRepresentation {
    /// `recipes_limit` truncates the embedded list; the count stays the total.
    pub fn new(
        followed: FollowedAuthor,
        recipes_limit: Option<usize>,
        base_url: &str,
    ) -> Self {
        let recipes_count = followed.recipes.len();
        let shown = recipes_limit.unwrap_or(recipes_count);
        Self {
            author: UserRepresentation::new(followed.author, true),
            recipes: followed
                .recipes
                .into_iter()
                .take(shown)
                .map(|recipe| RecipeSummaryRepresentation::new(recipe, base_url))
                .collect(),
            recipes_count,
        }
    }
}
