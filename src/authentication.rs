use anyhow::Context;
use argon2::{
    password_hash::SaltString, Argon2, Params, PasswordHash, PasswordHasher,
    PasswordVerifier,
};
use axum::http::{header::AUTHORIZATION, HeaderMap};
use secrecy::{ExposeSecret, Secret};

use crate::{
    database::{
        get_connection,
        queries::{
            change_password_query, find_user_by_token, get_password_hash,
            get_stored_credentials, ValidateUserError,
        },
        DatabaseConnection, DatabaseConnectionPool,
    },
    domain::{AuthTokenKey, Password, Role},
    routes::ApiError,
    telemetry::spawn_blocking_with_tracing,
};

pub mod middleware;

pub use middleware::*;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Unable to log in with provided credentials.")]
    InvalidCredentials(#[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

pub struct Credentials {
    pub email: String,
    pub password: Secret<String>,
}

/// The user behind the token of the current request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn may_edit(&self, author_id: i32) -> bool {
        self.id == author_id || self.is_admin()
    }
}

#[tracing::instrument(
    name = "Validate Credentials",
    skip(connection, credentials)
)]
pub async fn validate_credentials(
    credentials: Credentials,
    connection: &mut DatabaseConnection,
) -> Result<i32, AuthError> {
    let (stored_user_id, expected_hash) =
        match get_stored_credentials(&credentials.email, connection).await {
            Ok(row) => (Some(row.0), row.1),
            Err(e) => match e {
                ValidateUserError::DatabaseError(e) => {
                    return Err(AuthError::UnexpectedError(e.into()))
                }
                ValidateUserError::AuthenticationError(_) => (
                    None,
                    Secret::new(
                        "$argon2id$v=19$m=15000,t=2,p=1$\
                    gZiV/M1gPc22ElAH/Jh1Hw$\
                    CWOrkoo7oJBQ/iyh7uJ0LO2aLEfrHwTWllSAxT0zRno"
                            .to_string(),
                    ),
                ),
            },
        };

    spawn_blocking_with_tracing(move || {
        verify_password_hash(expected_hash, credentials.password)
    })
    .await
    .context("Failed to spawn blocking task.")
    .map_err(AuthError::UnexpectedError)??;

    stored_user_id.ok_or_else(|| {
        AuthError::InvalidCredentials(anyhow::anyhow!("Unknown email."))
    })
}

#[tracing::instrument(
    name = "Verify password hash",
    skip(expected_password_hash, password_candidate)
)]
fn verify_password_hash(
    expected_password_hash: Secret<String>,
    password_candidate: Secret<String>,
) -> Result<(), AuthError> {
    let expected_hash =
        PasswordHash::new(expected_password_hash.expose_secret())
            .context("Failed to parse hash in PHC format.")
            .map_err(AuthError::UnexpectedError)?;
    Argon2::default()
        .verify_password(
            password_candidate.expose_secret().as_bytes(),
            &expected_hash,
        )
        .context("Invalid password.")
        .map_err(AuthError::InvalidCredentials)?;
    Ok(())
}

/// Checks `candidate` against the stored hash of an already known user.
#[tracing::instrument(
    name = "Verify current password",
    skip(candidate, connection)
)]
pub async fn verify_current_password(
    user_id: i32,
    candidate: Secret<String>,
    connection: &mut DatabaseConnection,
) -> Result<(), AuthError> {
    let expected_hash = get_password_hash(connection, user_id)
        .await
        .context("Failed to retrieve the stored password hash.")?;
    spawn_blocking_with_tracing(move || {
        verify_password_hash(expected_hash, candidate)
    })
    .await
    .context("Failed to spawn blocking task.")
    .map_err(AuthError::UnexpectedError)?
}

#[tracing::instrument(name = "Hash password", skip(password))]
pub async fn hash_password(
    password: &Password,
) -> Result<Secret<String>, anyhow::Error> {
    let candidate = Secret::new(password.as_ref().expose_secret().to_owned());
    spawn_blocking_with_tracing(move || compute_password_hash(&candidate))
        .await?
        .context("Failed to hash password.")
}

#[tracing::instrument(name = "Change password", skip(password, connection))]
pub async fn change_password(
    user_id: i32,
    password: Password,
    connection: &mut DatabaseConnection,
) -> Result<(), anyhow::Error> {
    let password_hash = hash_password(&password).await?;
    change_password_query(connection, user_id, password_hash)
        .await
        .context("Failed to change password in the database.")?;
    Ok(())
}

fn compute_password_hash(
    password: &Secret<String>,
) -> Result<Secret<String>, anyhow::Error> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let params = Params::new(15000, 2, 1, None)
        .map_err(|e| anyhow::anyhow!("Invalid argon2 parameters: {}", e))?;
    let password_hash =
        Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params)
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
            .to_string();
    Ok(Secret::new(password_hash))
}

/// Resolves the `Authorization` header of a request. A missing header is an
/// anonymous request; a malformed or unknown token is rejected.
#[tracing::instrument(
    name = "Authenticate request",
    skip(headers, pool),
    fields(user_id = tracing::field::Empty)
)]
pub async fn authenticate(
    headers: &HeaderMap,
    pool: &DatabaseConnectionPool,
) -> Result<Option<CurrentUser>, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let key = value
        .to_str()
        .ok()
        .and_then(|value| AuthTokenKey::from_header(value).ok())
        .ok_or(ApiError::Unauthenticated)?;
    let mut connection = get_connection(pool)
        .await
        .context("Could not get connection from pool.")?;
    let user = find_user_by_token(&mut connection, &key)
        .await
        .context("Failed to look up authentication token.")?
        .ok_or(ApiError::Unauthenticated)?;
    tracing::Span::current()
        .record("user_id", tracing::field::display(user.id));
    Ok(Some(CurrentUser {
        id: user.id,
        role: user.role(),
        username: user.username,
    }))
}
