use anyhow::Context;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    authentication::CurrentUser,
    database::{get_connection, queries},
    domain::{Page, PageQuery, Paginated},
    representations::SubscriptionRepresentation,
    startup::ApplicationState,
};

use super::ApiError;

#[derive(serde::Deserialize, Debug, Default, Clone, Copy)]
pub struct SubscriptionQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub recipes_limit: Option<usize>,
}

#[derive(serde::Deserialize, Debug, Default, Clone, Copy)]
pub struct RecipesLimit {
    pub recipes_limit: Option<usize>,
}

#[tracing::instrument(
    name = "Subscribing to an author",
    skip(app_state, user),
    fields(user_id = %user.id)
)]
pub async fn subscribe(
    State(app_state): State<ApplicationState>,
    user: CurrentUser,
    Path(author_id): Path<i32>,
    query: Result<Query<RecipesLimit>, QueryRejection>,
) -> Result<(StatusCode, Json<SubscriptionRepresentation>), ApiError> {
    let Query(query) = query?;
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let followed = queries::follow(&mut connection, user.id, author_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubscriptionRepresentation::new(
            followed,
            query.recipes_limit,
            &app_state.base_url,
        )),
    ))
}

#[tracing::instrument(
    name = "Unsubscribing from an author",
    skip(app_state, user),
    fields(user_id = %user.id)
)]
pub async fn unsubscribe(
    State(app_state): State<ApplicationState>,
    user: CurrentUser,
    Path(author_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    queries::unfollow(&mut connection, user.id, author_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(
    name = "Listing subscriptions",
    skip(app_state, user),
    fields(user_id = %user.id)
)]
pub async fn subscriptions_list(
    State(app_state): State<ApplicationState>,
    user: CurrentUser,
    query: Result<Query<SubscriptionQuery>, QueryRejection>,
) -> Result<Json<Paginated<SubscriptionRepresentation>>, ApiError> {
    let Query(query) = query?;
    let page = Page::from(PageQuery {
        page: query.page,
        limit: query.limit,
    });
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let (followed, count) =
        queries::list_following(&mut connection, user.id, page)
            .await
            .context("Failed to list subscriptions.")?;
    let results = followed
        .into_iter()
        .map(|author| {
            SubscriptionRepresentation::new(
                author,
                query.recipes_limit,
                &app_state.base_url,
            )
        })
        .collect();
    Ok(Json(Paginated::new(results, count, page)))
}
