use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use secrecy::Secret;

use crate::{
    authentication::{
        change_password, hash_password, verify_current_password, AuthError,
        CurrentUser, MaybeUser,
    },
    database::{get_connection, queries},
    domain::{
        discard_image, NewUserData, Page, PageQuery, Paginated, Password,
    },
    representations::{RegisteredUser, UserRepresentation},
    startup::ApplicationState,
};

use super::ApiError;

#[derive(serde::Deserialize)]
pub struct RegistrationPayload {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(serde::Deserialize)]
pub struct SetPasswordPayload {
    pub new_password: String,
    pub current_password: Secret<String>,
}

#[tracing::instrument(
    name = "Registering a new user",
    skip(app_state, payload)
)]
pub async fn register_user(
    State(app_state): State<ApplicationState>,
    payload: Result<Json<RegistrationPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredUser>), ApiError> {
    let Json(payload) = payload?;
    let new_user = NewUserData::try_from(payload)?;
    let password_hash = hash_password(&new_user.password).await?;
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let user =
        queries::insert_user(&mut connection, &new_user, password_hash).await?;
    Ok((StatusCode::CREATED, Json(RegisteredUser::from(user))))
}

#[tracing::instrument(name = "Listing users", skip(app_state, viewer))]
pub async fn users_list(
    State(app_state): State<ApplicationState>,
    viewer: MaybeUser,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Paginated<UserRepresentation>>, ApiError> {
    let Query(query) = query?;
    let page = Page::from(query);
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let (users, count) = queries::list_users(&mut connection, page)
        .await
        .context("Failed to list users.")?;
    let ids: Vec<i32> = users.iter().map(|user| user.id).collect();
    let subscribed =
        queries::subscribed_author_ids(&mut connection, viewer.id(), &ids)
            .await
            .context("Failed to load subscriptions.")?;
    let results = users
        .into_iter()
        .map(|user| {
            let is_subscribed = subscribed.contains(&user.id);
            UserRepresentation::new(user, is_subscribed)
        })
        .collect();
    Ok(Json(Paginated::new(results, count, page)))
}

#[tracing::instrument(name = "Retrieving a user", skip(app_state, viewer))]
pub async fn user_detail(
    State(app_state): State<ApplicationState>,
    viewer: MaybeUser,
    Path(user_id): Path<i32>,
) -> Result<Json<UserRepresentation>, ApiError> {
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let user = queries::get_user(&mut connection, user_id)
        .await
        .context("Failed to retrieve user.")?
        .ok_or_else(|| {
            ApiError::NotFound(format!("User {} does not exist.", user_id))
        })?;
    let subscribed =
        queries::subscribed_author_ids(&mut connection, viewer.id(), &[user.id])
            .await
            .context("Failed to load subscriptions.")?;
    let is_subscribed = subscribed.contains(&user.id);
    Ok(Json(UserRepresentation::new(user, is_subscribed)))
}

#[tracing::instrument(
    name = "Retrieving the current user",
    skip(app_state, user),
    fields(user_id = %user.id)
)]
pub async fn current_user(
    State(app_state): State<ApplicationState>,
    user: CurrentUser,
) -> Result<Json<UserRepresentation>, ApiError> {
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let stored = queries::get_user(&mut connection, user.id)
        .await
        .context("Failed to retrieve user.")?
        .ok_or(ApiError::Unauthenticated)?;
    Ok(Json(UserRepresentation::new(stored, false)))
}

#[tracing::instrument(
    name = "Changing password",
    skip(app_state, user, payload),
    fields(user_id = %user.id)
)]
pub async fn set_password(
    State(app_state): State<ApplicationState>,
    user: CurrentUser,
    payload: Result<Json<SetPasswordPayload>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(payload) = payload?;
    let new_password = Password::try_from(payload.new_password)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    verify_current_password(user.id, payload.current_password, &mut connection)
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials(_) => ApiError::BadRequest(
                "The current password is incorrect.".to_string(),
            ),
            AuthError::UnexpectedError(e) => ApiError::UnexpectedError(e),
        })?;
    change_password(user.id, new_password, &mut connection).await?;
    tracing::info!("Password changed.");
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(
    name = "Deleting a user",
    skip(app_state, admin),
    fields(admin_id = %admin.id)
)]
pub async fn remove_user(
    State(app_state): State<ApplicationState>,
    admin: CurrentUser,
    Path(user_id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    if !admin.is_admin() {
        return Err(ApiError::Forbidden);
    }
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let images = queries::delete_user(&mut connection, user_id)
        .await
        .context("Failed to delete user.")?
        .ok_or_else(|| {
            ApiError::NotFound(format!("User {} does not exist.", user_id))
        })?;
    for image in &images {
        discard_image(&app_state.media_root, image).await;
    }
    Ok(StatusCode::NO_CONTENT)
}
