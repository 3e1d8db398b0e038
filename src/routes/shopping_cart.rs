use anyhow::Context;
use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::IntoResponse,
};

use crate::{
    authentication::CurrentUser,
    database::{get_connection, queries},
    domain::{shopping_list_filename, ShoppingList},
    startup::ApplicationState,
    utils::attachment_disposition,
};

use super::ApiError;

#[tracing::instrument(
    name = "Downloading the shopping list",
    skip(app_state, user),
    fields(user_id = %user.id)
)]
pub async fn download_shopping_cart(
    State(app_state): State<ApplicationState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let ingredients = queries::cart_ingredients(&mut connection, user.id)
        .await
        .context("Failed to load the shopping cart.")?;
    let list = ShoppingList::aggregate(ingredients);
    tracing::info!(items = list.items().len(), "Shopping list built.");
    let disposition =
        attachment_disposition(&shopping_list_filename(&user.username));
    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        list.render(),
    ))
}
