use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    authentication::CurrentUser,
    database::{
        get_connection,
        queries::{self, RecipeList},
    },
    representations::RecipeSummaryRepresentation,
    startup::ApplicationState,
};

use super::ApiError;

async fn add(
    app_state: &ApplicationState,
    list: RecipeList,
    user: &CurrentUser,
    recipe_id: i32,
) -> Result<(StatusCode, Json<RecipeSummaryRepresentation>), ApiError> {
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let recipe =
        queries::add_to_list(&mut connection, list, user.id, recipe_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(RecipeSummaryRepresentation::new(recipe, &app_state.base_url)),
    ))
}

async fn remove(
    app_state: &ApplicationState,
    list: RecipeList,
    user: &CurrentUser,
    recipe_id: i32,
) -> Result<StatusCode, ApiError> {
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    queries::remove_from_list(&mut connection, list, user.id, recipe_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(
    name = "Adding a favorite",
    skip(app_state, user),
    fields(user_id = %user.id)
)]
pub async fn favorite_add(
    State(app_state): State<ApplicationState>,
    user: CurrentUser,
    Path(recipe_id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeSummaryRepresentation>), ApiError> {
    add(&app_state, RecipeList::Favorites, &user, recipe_id).await
}

#[tracing::instrument(
    name = "Removing a favorite",
    skip(app_state, user),
    fields(user_id = %user.id)
)]
pub async fn favorite_remove(
    State(app_state): State<ApplicationState>,
    user: CurrentUser,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    remove(&app_state, RecipeList::Favorites, &user, recipe_id).await
}

#[tracing::instrument(
    name = "Adding to the shopping cart",
    skip(app_state, user),
    fields(user_id = %user.id)
)]
pub async fn cart_add(
    State(app_state): State<ApplicationState>,
    user: CurrentUser,
    Path(recipe_id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeSummaryRepresentation>), ApiError> {
    add(&app_state, RecipeList::ShoppingCart, &user, recipe_id).await
}

#[tracing::instrument(
    name = "Removing from the shopping cart",
    skip(app_state, user),
    fields(user_id = %user.id)
)]
pub async fn cart_remove(
    State(app_state): State<ApplicationState>,
    user: CurrentUser,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    remove(&app_state, RecipeList::ShoppingCart, &user, recipe_id).await
}
