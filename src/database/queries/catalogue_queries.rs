use crate::{
    database::DatabaseConnection,
    models::{Ingredient, Tag},
    schema::{ingredients, tags},
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

#[tracing::instrument(name = "List tags query", skip(connection))]
pub async fn list_tags(
    connection: &mut DatabaseConnection,
) -> Result<Vec<Tag>, diesel::result::Error> {
    tags::table
        .order(tags::name.asc())
        .select(Tag::as_select())
        .load(connection)
        .await
}

#[tracing::instrument(name = "Get tag query", skip(connection))]
pub async fn get_tag(
    connection: &mut DatabaseConnection,
    id: i32,
) -> Result<Option<Tag>, diesel::result::Error> {
    tags::table
        .find(id)
        .select(Tag::as_select())
        .first(connection)
        .await
        .optional()
}

/// Ingredients whose name starts with `prefix`, case-insensitively.
#[tracing::instrument(name = "Search ingredients query", skip(connection))]
pub async fn search_ingredients(
    connection: &mut DatabaseConnection,
    prefix: Option<&str>,
) -> Result<Vec<Ingredient>, diesel::result::Error> {
    let mut query = ingredients::table.into_boxed();
    if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
        query = query.filter(
            ingredients::name.ilike(format!("{}%", escape_like(prefix))),
        );
    }
    query
        .order(ingredients::name.asc())
        .select(Ingredient::as_select())
        .load(connection)
        .await
}

#[tracing::instrument(name = "Get ingredient query", skip(connection))]
pub async fn get_ingredient(
    connection: &mut DatabaseConnection,
    id: i32,
) -> Result<Option<Ingredient>, diesel::result::Error> {
    ingredients::table
        .find(id)
        .select(Ingredient::as_select())
        .first(connection)
        .await
        .optional()
}

/// The ids from `ids` that have no ingredient row.
#[tracing::instrument(name = "Check ingredients exist", skip(connection))]
pub async fn missing_ingredient_ids(
    connection: &mut DatabaseConnection,
    ids: &[i32],
) -> Result<Vec<i32>, diesel::result::Error> {
    let found: Vec<i32> = ingredients::table
        .filter(ingredients::id.eq_any(ids))
        .select(ingredients::id)
        .load(connection)
        .await?;
    Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
}

/// The ids from `ids` that have no tag row.
#[tracing::instrument(name = "Check tags exist", skip(connection))]
pub async fn missing_tag_ids(
    connection: &mut DatabaseConnection,
    ids: &[i32],
) -> Result<Vec<i32>, diesel::result::Error> {
    let found: Vec<i32> = tags::table
        .filter(tags::id.eq_any(ids))
        .select(tags::id)
        .load(connection)
        .await?;
    Ok(ids.iter().copied().filter(|id| !found.contains(id)).collect())
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
