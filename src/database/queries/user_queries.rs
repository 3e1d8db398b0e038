use crate::database::DatabaseConnection;
use crate::domain::{NewUserData, Page, Role};
use crate::models::{NewUser, User};
use crate::schema::{
    auth_tokens, favorites, recipe_ingredients, recipe_tags, recipes,
    shopping_cart, subscriptions, users,
};
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use secrecy::{ExposeSecret, Secret};

use super::is_unique_violation;

#[tracing::instrument(
    name = "Inserting user into database.",
    skip(new_user, password_hash, connection),
    fields(username = %new_user.username.as_ref())
)]
pub async fn insert_user(
    connection: &mut DatabaseConnection,
    new_user: &NewUserData,
    password_hash: Secret<String>,
) -> Result<User, InsertUserError> {
    let entry = NewUser {
        username: new_user.username.as_ref(),
        email: new_user.email.as_ref(),
        first_name: new_user.first_name.as_ref(),
        last_name: new_user.last_name.as_ref(),
        password_hash: password_hash.expose_secret(),
        role: Role::User.as_str(),
        date_joined: Utc::now(),
    };
    match diesel::insert_into(users::table)
        .values(&entry)
        .returning(User::as_returning())
        .get_result(connection)
        .await
    {
        Ok(user) => {
            tracing::info!("New user has been saved.");
            Ok(user)
        }
        Err(e) if is_unique_violation(&e) => {
            Err(InsertUserError::AlreadyExists)
        }
        Err(e) => {
            tracing::error!("Failed to execute query {:?}", e);
            Err(e.into())
        }
    }
}

#[tracing::instrument(name = "Get user query", skip(connection))]
pub async fn get_user(
    connection: &mut DatabaseConnection,
    id: i32,
) -> Result<Option<User>, diesel::result::Error> {
    users::table
        .find(id)
        .select(User::as_select())
        .first(connection)
        .await
        .optional()
}

#[tracing::instrument(name = "List users query", skip(connection))]
pub async fn list_users(
    connection: &mut DatabaseConnection,
    page: Page,
) -> Result<(Vec<User>, i64), diesel::result::Error> {
    let count = users::table.count().get_result(connection).await?;
    let rows = users::table
        .order(users::username.asc())
        .offset(page.offset())
        .limit(page.size)
        .select(User::as_select())
        .load(connection)
        .await?;
    Ok((rows, count))
}

#[tracing::instrument(
    name = "Retrieve stored credentials",
    skip(user_email, connection)
)]
pub async fn get_stored_credentials(
    user_email: &str,
    connection: &mut DatabaseConnection,
) -> Result<(i32, Secret<String>), ValidateUserError> {
    let row: Option<(i32, String)> = users::table
        .filter(users::email.eq(user_email))
        .select((users::id, users::password_hash))
        .first(connection)
        .await
        .optional()?;
    match row {
        Some(row) => Ok((row.0, Secret::new(row.1))),
        None => Err(ValidateUserError::AuthenticationError(
            "Unknown email".into(),
        )),
    }
}

#[tracing::instrument(name = "Retrieve password hash", skip(connection))]
pub async fn get_password_hash(
    connection: &mut DatabaseConnection,
    user_id: i32,
) -> Result<Secret<String>, diesel::result::Error> {
    users::table
        .find(user_id)
        .select(users::password_hash)
        .first::<String>(connection)
        .await
        .map(Secret::new)
}

#[tracing::instrument(
    name = "Change password query",
    skip(connection, password_hash)
)]
pub async fn change_password_query(
    connection: &mut DatabaseConnection,
    user_id: i32,
    password_hash: Secret<String>,
) -> Result<(), diesel::result::Error> {
    diesel::update(users::table.find(user_id))
        .set(users::password_hash.eq(password_hash.expose_secret()))
        .execute(connection)
        .await?;
    Ok(())
}

/// Removes a user together with their recipes and every relation that
/// points at the user or at those recipes. Returns the image paths of the
/// removed recipes, or `None` when the user does not exist.
#[tracing::instrument(name = "Delete user query", skip(connection))]
pub async fn delete_user(
    connection: &mut DatabaseConnection,
    user_id: i32,
) -> Result<Option<Vec<String>>, diesel::result::Error> {
    connection
        .transaction::<_, diesel::result::Error, _>(|conn| {
            async move {
                let owned_recipes = recipes::table
                    .filter(recipes::author_id.eq(user_id))
                    .select(recipes::id);
                diesel::delete(favorites::table.filter(
                    favorites::user_id.eq(user_id).or(favorites::recipe_id
                        .eq_any(owned_recipes.clone())),
                ))
                .execute(conn)
                .await?;
                diesel::delete(shopping_cart::table.filter(
                    shopping_cart::user_id.eq(user_id).or(
                        shopping_cart::recipe_id
                            .eq_any(owned_recipes.clone()),
                    ),
                ))
                .execute(conn)
                .await?;
                diesel::delete(recipe_ingredients::table.filter(
                    recipe_ingredients::recipe_id
                        .eq_any(owned_recipes.clone()),
                ))
                .execute(conn)
                .await?;
                diesel::delete(recipe_tags::table.filter(
                    recipe_tags::recipe_id.eq_any(owned_recipes.clone()),
                ))
                .execute(conn)
                .await?;
                let images = diesel::delete(
                    recipes::table.filter(recipes::author_id.eq(user_id)),
                )
                .returning(recipes::image)
                .get_results::<String>(conn)
                .await?;
                diesel::delete(
                    subscriptions::table.filter(
                        subscriptions::user_id
                            .eq(user_id)
                            .or(subscriptions::author_id.eq(user_id)),
                    ),
                )
                .execute(conn)
                .await?;
                diesel::delete(
                    auth_tokens::table.filter(auth_tokens::user_id.eq(user_id)),
                )
                .execute(conn)
                .await?;
                let deleted = diesel::delete(users::table.find(user_id))
                    .execute(conn)
                    .await?;
                Ok((deleted == 1).then_some(images))
            }
            .scope_boxed()
        })
        .await
}

#[derive(Debug, thiserror::Error)]
pub enum InsertUserError {
    #[error("A user with that username or email already exists.")]
    AlreadyExists,
    #[error("A database error has ocurred when storing a user.")]
    DatabaseError(#[from] diesel::result::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ValidateUserError {
    #[error("Could not fetch user data.")]
    DatabaseError(#[from] diesel::result::Error),
    #[error("Invalid email or password.")]
    AuthenticationError(String),
}
