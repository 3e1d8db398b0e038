use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::{routes::ApiError, startup::ApplicationState};

use super::{authenticate, CurrentUser};

#[tracing::instrument(
    name = "Middleware Credential Checking",
    skip(app_state, request, next)
)]
pub async fn require_authentication(
    State(app_state): State<ApplicationState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(request.headers(), &app_state.database_pool)
        .await?
        .ok_or(ApiError::Unauthenticated)?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[async_trait]
impl FromRequestParts<ApplicationState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApplicationState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }
        authenticate(&parts.headers, &state.database_pool)
            .await?
            .ok_or(ApiError::Unauthenticated)
    }
}

/// The requesting user on endpoints that also serve anonymous visitors.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn id(&self) -> Option<i32> {
        self.0.as_ref().map(|user| user.id)
    }
}

#[async_trait]
impl FromRequestParts<ApplicationState> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApplicationState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(Self(Some(user.clone())));
        }
        Ok(Self(authenticate(&parts.headers, &state.database_pool).await?))
    }
}
