use std::collections::{HashMap, HashSet};

use crate::{
    database::DatabaseConnection,
    domain::Page,
    models::{NewSubscription, RecipeSummary, User},
    schema::{recipes, subscriptions, users},
};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error};
use diesel_async::RunQueryDsl;

use super::{get_user, is_foreign_key_violation, is_unique_violation};

/// An author as seen from a subscriber, with every recipe they published.
#[derive(Debug, Clone)]
pub struct FollowedAuthor {
    pub author: User,
    pub recipes: Vec<RecipeSummary>,
}

#[tracing::instrument(name = "Subscribing to author", skip(connection))]
pub async fn follow(
    connection: &mut DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<FollowedAuthor, SubscriptionError> {
    if user_id == author_id {
        return Err(SubscriptionError::SelfFollow);
    }
    let author = get_user(connection, author_id)
        .await?
        .ok_or(SubscriptionError::AuthorNotFound(author_id))?;
    let inserted = diesel::insert_into(subscriptions::table)
        .values(&NewSubscription { user_id, author_id })
        .execute(connection)
        .await;
    match inserted {
        Ok(_) => tracing::info!("Subscription saved."),
        Err(e) => return Err(SubscriptionError::from_insert(e, author_id)),
    }
    let mut recipes = recipes_by_author(connection, &[author_id]).await?;
    Ok(FollowedAuthor {
        recipes: recipes.remove(&author_id).unwrap_or_default(),
        author,
    })
}

#[tracing::instrument(name = "Unsubscribing from author", skip(connection))]
pub async fn unfollow(
    connection: &mut DatabaseConnection,
    user_id: i32,
    author_id: i32,
) -> Result<(), SubscriptionError> {
    if user_id == author_id {
        return Err(SubscriptionError::SelfFollow);
    }
    if get_user(connection, author_id).await?.is_none() {
        return Err(SubscriptionError::AuthorNotFound(author_id));
    }
    let deleted = diesel::delete(
        subscriptions::table
            .filter(subscriptions::user_id.eq(user_id))
            .filter(subscriptions::author_id.eq(author_id)),
    )
    .execute(connection)
    .await?;
    if deleted == 0 {
        return Err(SubscriptionError::NotSubscribed);
    }
    tracing::info!("Subscription removed.");
    Ok(())
}

#[tracing::instrument(name = "List subscriptions query", skip(connection))]
pub async fn list_following(
    connection: &mut DatabaseConnection,
    user_id: i32,
    page: Page,
) -> Result<(Vec<FollowedAuthor>, i64), Error> {
    let count = subscriptions::table
        .filter(subscriptions::user_id.eq(user_id))
        .count()
        .get_result(connection)
        .await?;
    let authors: Vec<User> = subscriptions::table
        .inner_join(users::table.on(users::id.eq(subscriptions::author_id)))
        .filter(subscriptions::user_id.eq(user_id))
        .order(subscriptions::id.asc())
        .offset(page.offset())
        .limit(page.size)
        .select(User::as_select())
        .load(connection)
        .await?;
    let author_ids: Vec<i32> = authors.iter().map(|a| a.id).collect();
    let mut recipes = recipes_by_author(connection, &author_ids).await?;
    let followed = authors
        .into_iter()
        .map(|author| FollowedAuthor {
            recipes: recipes.remove(&author.id).unwrap_or_default(),
            author,
        })
        .collect();
    Ok((followed, count))
}

/// Which of `author_ids` the user is subscribed to.
#[tracing::instrument(name = "Check subscriptions", skip(connection))]
pub async fn subscribed_author_ids(
    connection: &mut DatabaseConnection,
    user_id: Option<i32>,
    author_ids: &[i32],
) -> Result<HashSet<i32>, Error> {
    let Some(user_id) = user_id else {
        return Ok(HashSet::new());
    };
    let ids: Vec<i32> = subscriptions::table
        .filter(subscriptions::user_id.eq(user_id))
        .filter(subscriptions::author_id.eq_any(author_ids))
        .select(subscriptions::author_id)
        .load(connection)
        .await?;
    Ok(ids.into_iter().collect())
}

async fn recipes_by_author(
    connection: &mut DatabaseConnection,
    author_ids: &[i32],
) -> Result<HashMap<i32, Vec<RecipeSummary>>, Error> {
    let rows: Vec<(i32, RecipeSummary)> = recipes::table
        .filter(recipes::author_id.eq_any(author_ids))
        .order((recipes::pub_date.desc(), recipes::id.desc()))
        .select((recipes::author_id, RecipeSummary::as_select()))
        .load(connection)
        .await?;
    let mut grouped: HashMap<i32, Vec<RecipeSummary>> = HashMap::new();
    for (author_id, recipe) in rows {
        grouped.entry(author_id).or_default().push(recipe);
    }
    Ok(grouped)
}

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("You cannot subscribe to yourself.")]
    SelfFollow,
    #[error("You are already subscribed to this author.")]
    AlreadySubscribed,
    #[error("You are not subscribed to this author.")]
    NotSubscribed,
    #[error("User {0} does not exist.")]
    AuthorNotFound(i32),
    #[error("A database error has ocurred when updating subscriptions.")]
    DatabaseError(#[from] diesel::result::Error),
}

impl SubscriptionError {
    fn from_insert(error: Error, author_id: i32) -> Self {
        match error {
            e if is_unique_violation(&e) => Self::AlreadySubscribed,
            e if is_foreign_key_violation(&e) => {
                Self::AuthorNotFound(author_id)
            }
            Error::DatabaseError(DatabaseErrorKind::CheckViolation, _) => {
                Self::SelfFollow
            }
            e => Self::DatabaseError(e),
        }
    }
}
