use crate::{
    database::DatabaseConnection,
    models::{NewFavorite, NewShoppingCartEntry, RecipeSummary},
    schema::{favorites, recipes, shopping_cart},
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::{is_foreign_key_violation, is_unique_violation};

/// The per-user recipe lists managed by the same add/remove rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl std::fmt::Display for RecipeList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Favorites => write!(f, "favorites"),
            Self::ShoppingCart => write!(f, "shopping cart"),
        }
    }
}

#[tracing::instrument(name = "Get recipe summary", skip(connection))]
pub async fn get_recipe_summary(
    connection: &mut DatabaseConnection,
    recipe_id: i32,
) -> Result<Option<RecipeSummary>, diesel::result::Error> {
    recipes::table
        .find(recipe_id)
        .select(RecipeSummary::as_select())
        .first(connection)
        .await
        .optional()
}

/// Puts a recipe on one of the user's lists. A second insert of the same
/// pair is rejected by the unique index and reported as `AlreadyListed`.
#[tracing::instrument(name = "Adding recipe to list", skip(connection))]
pub async fn add_to_list(
    connection: &mut DatabaseConnection,
    list: RecipeList,
    user_id: i32,
    recipe_id: i32,
) -> Result<RecipeSummary, RelationError> {
    let recipe = get_recipe_summary(connection, recipe_id)
        .await?
        .ok_or(RelationError::RecipeNotFound(recipe_id))?;
    let inserted = match list {
        RecipeList::Favorites => {
            diesel::insert_into(favorites::table)
                .values(&NewFavorite { user_id, recipe_id })
                .execute(connection)
                .await
        }
        RecipeList::ShoppingCart => {
            diesel::insert_into(shopping_cart::table)
                .values(&NewShoppingCartEntry { user_id, recipe_id })
                .execute(connection)
                .await
        }
    };
    match inserted {
        Ok(_) => {
            tracing::info!("Recipe added to the {}.", list);
            Ok(recipe)
        }
        Err(e) => Err(RelationError::from_insert(e, list, recipe_id)),
    }
}

#[tracing::instrument(name = "Removing recipe from list", skip(connection))]
pub async fn remove_from_list(
    connection: &mut DatabaseConnection,
    list: RecipeList,
    user_id: i32,
    recipe_id: i32,
) -> Result<(), RelationError> {
    if get_recipe_summary(connection, recipe_id).await?.is_none() {
        return Err(RelationError::RecipeNotFound(recipe_id));
    }
    let deleted = match list {
        RecipeList::Favorites => {
            diesel::delete(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::recipe_id.eq(recipe_id)),
            )
            .execute(connection)
            .await?
        }
        RecipeList::ShoppingCart => {
            diesel::delete(
                shopping_cart::table
                    .filter(shopping_cart::user_id.eq(user_id))
                    .filter(shopping_cart::recipe_id.eq(recipe_id)),
            )
            .execute(connection)
            .await?
        }
    };
    if deleted == 0 {
        return Err(RelationError::NotListed(list));
    }
    tracing::info!("Recipe removed from the {}.", list);
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("Recipe is already in the {0}.")]
    AlreadyListed(RecipeList),
    #[error("Recipe is not in the {0}.")]
    NotListed(RecipeList),
    #[error("Recipe {0} does not exist.")]
    RecipeNotFound(i32),
    #[error("A database error has ocurred when updating a recipe list.")]
    DatabaseError(#[from] diesel::result::Error),
}

impl RelationError {
    fn from_insert(
        error: diesel::result::Error,
        list: RecipeList,
        recipe_id: i32,
    ) -> Self {
        if is_unique_violation(&error) {
            Self::AlreadyListed(list)
        } else if is_foreign_key_violation(&error) {
            Self::RecipeNotFound(recipe_id)
        } else {
            Self::DatabaseError(error)
        }
    }
}
