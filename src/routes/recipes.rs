use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};

use crate::{
    authentication::{CurrentUser, MaybeUser},
    database::{
        get_connection,
        queries::{self, RecipeFilter},
        DatabaseConnection,
    },
    domain::{
        discard_image, IngredientQuantity, Page, PageQuery, Paginated,
        RecipeDraft, RecipePatch,
    },
    representations::RecipeRepresentation,
    startup::ApplicationState,
};

use super::ApiError;

#[derive(serde::Deserialize, Debug, Clone, Copy)]
pub struct IngredientEntry {
    pub id: i32,
    pub amount: i32,
}

#[derive(serde::Deserialize)]
pub struct RecipePayload {
    pub ingredients: Vec<IngredientEntry>,
    pub tags: Vec<i32>,
    pub image: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(serde::Deserialize, Default)]
pub struct RecipePatchPayload {
    pub ingredients: Option<Vec<IngredientEntry>>,
    pub tags: Option<Vec<i32>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
}

/// Parses the recipe list query string. `tags` may repeat, so the pairs
/// are read by hand instead of through a flat struct.
pub fn parse_recipe_query(
    pairs: Vec<(String, String)>,
) -> Result<(RecipeFilter, PageQuery), ApiError> {
    let mut filter = RecipeFilter::default();
    let mut page = PageQuery::default();
    for (key, value) in pairs {
        match key.as_str() {
            "page" => page.page = Some(parse_number(&key, &value)?),
            "limit" => page.limit = Some(parse_number(&key, &value)?),
            "author" => filter.author = Some(parse_number(&key, &value)?),
            "tags" => filter.tags.push(value),
            "is_favorited" => {
                filter.is_favorited = Some(parse_flag(&key, &value)?)
            }
            "is_in_shopping_cart" => {
                filter.is_in_shopping_cart = Some(parse_flag(&key, &value)?)
            }
            _ => {}
        }
    }
    Ok((filter, page))
}

fn parse_number<T: std::str::FromStr>(
    key: &str,
    value: &str,
) -> Result<T, ApiError> {
    value.parse().map_err(|_| {
        ApiError::BadRequest(format!("`{}` must be a number.", key))
    })
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ApiError> {
    match value.to_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ApiError::BadRequest(format!(
            "`{}` must be 0 or 1.",
            key
        ))),
    }
}

/// Rejects drafts that reference ingredients or tags that do not exist.
async fn check_references(
    connection: &mut DatabaseConnection,
    ingredients: Option<&[IngredientQuantity]>,
    tags: Option<&[i32]>,
) -> Result<(), ApiError> {
    if let Some(ingredients) = ingredients {
        let ids: Vec<i32> =
            ingredients.iter().map(|i| i.ingredient_id).collect();
        let missing = queries::missing_ingredient_ids(connection, &ids)
            .await
            .context("Failed to check ingredients.")?;
        if let Some(id) = missing.first() {
            return Err(ApiError::BadRequest(format!(
                "Ingredient {} does not exist.",
                id
            )));
        }
    }
    if let Some(tags) = tags {
        let missing = queries::missing_tag_ids(connection, tags)
            .await
            .context("Failed to check tags.")?;
        if let Some(id) = missing.first() {
            return Err(ApiError::BadRequest(format!(
                "Tag {} does not exist.",
                id
            )));
        }
    }
    Ok(())
}

async fn load_representation(
    connection: &mut DatabaseConnection,
    recipe_id: i32,
    viewer: Option<i32>,
    base_url: &str,
) -> Result<RecipeRepresentation, ApiError> {
    let details = queries::get_recipe_details(connection, recipe_id, viewer)
        .await
        .context("Failed to load recipe.")?
        .ok_or_else(|| recipe_not_found(recipe_id))?;
    Ok(RecipeRepresentation::new(details, base_url))
}

fn recipe_not_found(recipe_id: i32) -> ApiError {
    ApiError::NotFound(format!("Recipe {} does not exist.", recipe_id))
}

#[tracing::instrument(name = "Listing recipes", skip(app_state, viewer))]
pub async fn recipe_list(
    State(app_state): State<ApplicationState>,
    viewer: MaybeUser,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Paginated<RecipeRepresentation>>, ApiError> {
    let Query(pairs) = query?;
    let (filter, page_query) = parse_recipe_query(pairs)?;
    let page = Page::from(page_query);
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let (recipes, count) =
        queries::list_recipes(&mut connection, &filter, viewer.id(), page)
            .await
            .context("Failed to list recipes.")?;
    let results = recipes
        .into_iter()
        .map(|details| RecipeRepresentation::new(details, &app_state.base_url))
        .collect();
    Ok(Json(Paginated::new(results, count, page)))
}

#[tracing::instrument(name = "Retrieving a recipe", skip(app_state, viewer))]
pub async fn recipe_detail(
    State(app_state): State<ApplicationState>,
    viewer: MaybeUser,
    Path(recipe_id): Path<i32>,
) -> Result<Json<RecipeRepresentation>, ApiError> {
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let representation = load_representation(
        &mut connection,
        recipe_id,
        viewer.id(),
        &app_state.base_url,
    )
    .await?;
    Ok(Json(representation))
}

#[tracing::instrument(
    name = "Creating a recipe",
    skip(app_state, author, payload),
    fields(author_id = %author.id)
)]
pub async fn recipe_create(
    State(app_state): State<ApplicationState>,
    author: CurrentUser,
    payload: Result<Json<RecipePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeRepresentation>), ApiError> {
    let Json(payload) = payload?;
    let draft = RecipeDraft::try_from(payload)?;
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    check_references(
        &mut connection,
        Some(draft.ingredients.as_slice()),
        Some(draft.tags.as_slice()),
    )
    .await?;
    let image_path = draft
        .image
        .store(&app_state.media_root)
        .await
        .context("Failed to store the recipe image.")?;
    let inserted =
        queries::insert_recipe(&mut connection, author.id, &draft, &image_path)
            .await
            .context("Failed to insert recipe.");
    let recipe_id = match inserted {
        Ok(recipe_id) => recipe_id,
        Err(e) => {
            discard_image(&app_state.media_root, &image_path).await;
            return Err(e.into());
        }
    };
    let representation = load_representation(
        &mut connection,
        recipe_id,
        Some(author.id),
        &app_state.base_url,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(representation)))
}

#[tracing::instrument(
    name = "Updating a recipe",
    skip(app_state, editor, payload),
    fields(editor_id = %editor.id)
)]
pub async fn recipe_update(
    State(app_state): State<ApplicationState>,
    editor: CurrentUser,
    Path(recipe_id): Path<i32>,
    payload: Result<Json<RecipePatchPayload>, JsonRejection>,
) -> Result<Json<RecipeRepresentation>, ApiError> {
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let recipe = queries::get_recipe(&mut connection, recipe_id)
        .await
        .context("Failed to retrieve recipe.")?
        .ok_or_else(|| recipe_not_found(recipe_id))?;
    if !editor.may_edit(recipe.author_id) {
        return Err(ApiError::Forbidden);
    }
    let Json(payload) = payload?;
    let patch = RecipePatch::try_from(payload)?;
    check_references(
        &mut connection,
        patch.ingredients.as_deref(),
        patch.tags.as_deref(),
    )
    .await?;
    let image_path = match &patch.image {
        Some(image) => Some(
            image
                .store(&app_state.media_root)
                .await
                .context("Failed to store the recipe image.")?,
        ),
        None => None,
    };
    let updated = queries::update_recipe(
        &mut connection,
        recipe_id,
        &patch,
        image_path.as_deref(),
    )
    .await
    .context("Failed to update recipe.");
    match (updated, image_path) {
        (Ok(()), Some(_)) => {
            discard_image(&app_state.media_root, &recipe.image).await
        }
        (Ok(()), None) => {}
        (Err(e), stored) => {
            if let Some(stored) = stored {
                discard_image(&app_state.media_root, &stored).await;
            }
            return Err(e.into());
        }
    }
    let representation = load_representation(
        &mut connection,
        recipe_id,
        Some(editor.id),
        &app_state.base_url,
    )
    .await?;
    Ok(Json(representation))
}

#[tracing::instrument(
    name = "Deleting a recipe",
    skip(app_state, editor),
    fields(editor_id = %editor.id)
)]
pub async fn recipe_delete(
    State(app_state): State<ApplicationState>,
    editor: CurrentUser,
    Path(recipe_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let recipe = queries::get_recipe(&mut connection, recipe_id)
        .await
        .context("Failed to retrieve recipe.")?
        .ok_or_else(|| recipe_not_found(recipe_id))?;
    if !editor.may_edit(recipe.author_id) {
        return Err(ApiError::Forbidden);
    }
    let image = queries::delete_recipe(&mut connection, recipe_id)
        .await
        .context("Failed to delete recipe.")?
        .ok_or_else(|| recipe_not_found(recipe_id))?;
    tracing::info!("Recipe deleted.");
    discard_image(&app_state.media_root, &image).await;
    Ok(StatusCode::NO_CONTENT)
}
