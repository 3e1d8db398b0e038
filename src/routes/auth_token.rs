use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use secrecy::Secret;

use crate::{
    authentication::{validate_credentials, Credentials, CurrentUser},
    database::{get_connection, queries},
    representations::TokenResponse,
    startup::ApplicationState,
};

use super::ApiError;

#[derive(serde::Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: Secret<String>,
}

#[tracing::instrument(
    name = "Token login",
    skip(app_state, payload),
    fields(user_id = tracing::field::Empty)
)]
pub async fn login(
    State(app_state): State<ApplicationState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
    let Json(payload) = payload?;
    let credentials = Credentials {
        email: payload.email,
        password: payload.password,
    };
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    let user_id = validate_credentials(credentials, &mut connection).await?;
    tracing::Span::current()
        .record("user_id", tracing::field::display(user_id));
    let auth_token = queries::issue_token(&mut connection, user_id)
        .await
        .context("Failed to issue an auth token.")?;
    Ok((StatusCode::CREATED, Json(TokenResponse { auth_token })))
}

#[tracing::instrument(
    name = "Token logout",
    skip(app_state, user),
    fields(user_id = %user.id)
)]
pub async fn logout(
    State(app_state): State<ApplicationState>,
    user: CurrentUser,
) -> Result<StatusCode, ApiError> {
    let mut connection = get_connection(&app_state.database_pool)
        .await
        .context("Could not get connection from pool.")?;
    queries::delete_token(&mut connection, user.id)
        .await
        .context("Failed to revoke the auth token.")?;
    tracing::info!("User logged out.");
    Ok(StatusCode::NO_CONTENT)
}
