use crate::{
    database::DatabaseConnection,
    domain::AuthTokenKey,
    models::{AuthToken, User},
    schema::{auth_tokens, users},
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

/// Returns the user's token, creating one on first login.
#[tracing::instrument(name = "Issuing auth token", skip(connection))]
pub async fn issue_token(
    connection: &mut DatabaseConnection,
    user_id: i32,
) -> Result<String, StoreTokenError> {
    let candidate = AuthTokenKey::generate();
    diesel::insert_into(auth_tokens::table)
        .values(&AuthToken::new(candidate.as_ref(), user_id))
        .on_conflict(auth_tokens::user_id)
        .do_nothing()
        .execute(connection)
        .await?;
    let key = auth_tokens::table
        .filter(auth_tokens::user_id.eq(user_id))
        .select(auth_tokens::key)
        .first(connection)
        .await?;
    tracing::info!("Auth token issued.");
    Ok(key)
}

#[tracing::instrument(name = "Getting the user for the token", skip_all)]
pub async fn find_user_by_token(
    connection: &mut DatabaseConnection,
    key: &AuthTokenKey,
) -> Result<Option<User>, diesel::result::Error> {
    auth_tokens::table
        .inner_join(users::table)
        .filter(auth_tokens::key.eq(key.as_ref()))
        .select(User::as_select())
        .first(connection)
        .await
        .optional()
}

#[tracing::instrument(name = "Revoking auth token", skip(connection))]
pub async fn delete_token(
    connection: &mut DatabaseConnection,
    user_id: i32,
) -> Result<(), diesel::result::Error> {
    diesel::delete(auth_tokens::table.filter(auth_tokens::user_id.eq(user_id)))
        .execute(connection)
        .await?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
#[error("A database error has ocurred when storing an auth token")]
pub struct StoreTokenError(#[from] diesel::result::Error);
