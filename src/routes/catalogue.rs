use anyhow::Context;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Json,
};

use crate::{
    database::{get_connection, queries},
    models::{Ingredient, Tag},
    startup::ApplicationState,
};

use super::ApiError;

#[derive(serde::Deserialize, Debug, Default)]
pub struct IngredientSearch {
    pub name: Option<String>,
}

#[tracing::instrument(name = "Listing tags", skip(app_state))]
pub async fn tags_list(
    State(app_state): State<ApplicationState>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let tags = queries::list_tags(&mut connection)
        .await
        .context("Failed to list tags.")?;
    Ok(Json(tags))
}

#[tracing::instrument(name = "Retrieving a tag", skip(app_state))]
pub async fn tag_detail(
    State(app_state): State<ApplicationState>,
    Path(tag_id): Path<i32>,
) -> Result<Json<Tag>, ApiError> {
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    queries::get_tag(&mut connection, tag_id)
        .await
        .context("Failed to retrieve tag.")?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("Tag {} does not exist.", tag_id))
        })
}

#[tracing::instrument(name = "Searching ingredients", skip(app_state))]
pub async fn ingredients_list(
    State(app_state): State<ApplicationState>,
    search: Result<Query<IngredientSearch>, QueryRejection>,
) -> Result<Json<Vec<Ingredient>>, ApiError> {
    let Query(search) = search?;
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let ingredients =
        queries::search_ingredients(&mut connection, search.name.as_deref())
            .await
            .context("Failed to search ingredients.")?;
    Ok(Json(ingredients))
}

#[tracing::instrument(name = "Retrieving an ingredient", skip(app_state))]
pub async fn ingredient_detail(
    State(app_state): State<ApplicationState>,
    Path(ingredient_id): Path<i32>,
) -> Result<Json<Ingredient>, ApiError> {
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    queries::get_ingredient(&mut connection, ingredient_id)
        .await
        .context("Failed to retrieve ingredient.")?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "Ingredient {} does not exist.",
                ingredient_id
            ))
        })
}
