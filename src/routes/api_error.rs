use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::{
    authentication::AuthError,
    database::queries::{InsertUserError, RelationError, SubscriptionError},
    domain::{InvalidRecipe, InvalidUser},
};

/// Every failure a handler can report. The body is always
/// `{"errors": "<message>"}`.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthenticated,
    #[error("You do not have permission to perform this action.")]
    Forbidden,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            errors: String,
        }
        let status = self.status();
        let errors = match self {
            Self::UnexpectedError(e) => {
                tracing::error!("{} Reason: {:?}", e, e);
                "Something went wrong".to_string()
            }
            other => {
                tracing::info!("Request rejected: {}", other);
                other.to_string()
            }
        };
        (status, Json(ErrorResponse { errors })).into_response()
    }
}

impl From<RelationError> for ApiError {
    fn from(e: RelationError) -> Self {
        match e {
            RelationError::AlreadyListed(_) | RelationError::NotListed(_) => {
                Self::BadRequest(e.to_string())
            }
            RelationError::RecipeNotFound(_) => Self::NotFound(e.to_string()),
            RelationError::DatabaseError(_) => Self::UnexpectedError(e.into()),
        }
    }
}

impl From<SubscriptionError> for ApiError {
    fn from(e: SubscriptionError) -> Self {
        match e {
            SubscriptionError::SelfFollow
            | SubscriptionError::AlreadySubscribed
            | SubscriptionError::NotSubscribed => Self::BadRequest(e.to_string()),
            SubscriptionError::AuthorNotFound(_) => {
                Self::NotFound(e.to_string())
            }
            SubscriptionError::DatabaseError(_) => {
                Self::UnexpectedError(e.into())
            }
        }
    }
}

impl From<InsertUserError> for ApiError {
    fn from(e: InsertUserError) -> Self {
        match e {
            InsertUserError::AlreadyExists => Self::BadRequest(e.to_string()),
            InsertUserError::DatabaseError(_) => Self::UnexpectedError(e.into()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials(_) => Self::BadRequest(e.to_string()),
            AuthError::UnexpectedError(e) => Self::UnexpectedError(e),
        }
    }
}

impl From<InvalidRecipe> for ApiError {
    fn from(e: InvalidRecipe) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<InvalidUser> for ApiError {
    fn from(e: InvalidUser) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}
