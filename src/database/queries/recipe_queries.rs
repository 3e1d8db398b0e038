use std::collections::{HashMap, HashSet};

use crate::{
    database::DatabaseConnection,
    domain::{IngredientQuantity, Page, RecipeDraft, RecipePatch},
    models::{
        NewIngredientAmount, NewRecipe, Recipe, RecipeChangeset,
        RecipeIngredientLink, RecipeTagLink, Tag, User,
    },
    schema::{
        favorites, ingredient_amounts, ingredients, recipe_ingredients,
        recipe_tags, recipes, shopping_cart, tags, users,
    },
};
use chrono::Utc;
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::result::Error;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use super::subscribed_author_ids;

/// Query-string filters of the recipe list. The two flags only apply to
/// authenticated viewers: `Some(true)` keeps the viewer's related recipes,
/// `Some(false)` excludes them.
#[derive(Debug, Default, Clone)]
pub struct RecipeFilter {
    pub author: Option<i32>,
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct RecipeIngredientRow {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// A recipe with everything its full representation needs.
#[derive(Debug, Clone)]
pub struct RecipeDetails {
    pub recipe: Recipe,
    pub author: User,
    pub author_subscribed: bool,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<RecipeIngredientRow>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

fn filtered_recipes(
    filter: &RecipeFilter,
    viewer: Option<i32>,
) -> recipes::BoxedQuery<'static, Pg> {
    let mut query = recipes::table.into_boxed();
    if let Some(author_id) = filter.author {
        query = query.filter(recipes::author_id.eq(author_id));
    }
    if !filter.tags.is_empty() {
        let tagged = recipe_tags::table
            .inner_join(tags::table)
            .filter(tags::slug.eq_any(filter.tags.clone()))
            .select(recipe_tags::recipe_id);
        query = query.filter(recipes::id.eq_any(tagged));
    }
    let Some(viewer) = viewer else {
        return query;
    };
    let favorited = favorites::table
        .filter(favorites::user_id.eq(viewer))
        .select(favorites::recipe_id);
    match filter.is_favorited {
        Some(true) => query = query.filter(recipes::id.eq_any(favorited)),
        Some(false) => {
            query = query.filter(diesel::dsl::not(recipes::id.eq_any(favorited)))
        }
        None => {}
    }
    let in_cart = shopping_cart::table
        .filter(shopping_cart::user_id.eq(viewer))
        .select(shopping_cart::recipe_id);
    match filter.is_in_shopping_cart {
        Some(true) => query = query.filter(recipes::id.eq_any(in_cart)),
        Some(false) => {
            query = query.filter(diesel::dsl::not(recipes::id.eq_any(in_cart)))
        }
        None => {}
    }
    query
}

#[tracing::instrument(name = "List recipes query", skip(connection))]
pub async fn list_recipes(
    connection: &mut DatabaseConnection,
    filter: &RecipeFilter,
    viewer: Option<i32>,
    page: Page,
) -> Result<(Vec<RecipeDetails>, i64), Error> {
    let count = filtered_recipes(filter, viewer)
        .count()
        .get_result(connection)
        .await?;
    let rows = filtered_recipes(filter, viewer)
        .order((recipes::pub_date.desc(), recipes::id.desc()))
        .offset(page.offset())
        .limit(page.size)
        .select(Recipe::as_select())
        .load(connection)
        .await?;
    let details = load_details(connection, rows, viewer).await?;
    Ok((details, count))
}

#[tracing::instrument(name = "Get recipe query", skip(connection))]
pub async fn get_recipe(
    connection: &mut DatabaseConnection,
    recipe_id: i32,
) -> Result<Option<Recipe>, Error> {
    recipes::table
        .find(recipe_id)
        .select(Recipe::as_select())
        .first(connection)
        .await
        .optional()
}

#[tracing::instrument(name = "Get recipe details query", skip(connection))]
pub async fn get_recipe_details(
    connection: &mut DatabaseConnection,
    recipe_id: i32,
    viewer: Option<i32>,
) -> Result<Option<RecipeDetails>, Error> {
    let Some(recipe) = get_recipe(connection, recipe_id).await? else {
        return Ok(None);
    };
    Ok(load_details(connection, vec![recipe], viewer).await?.pop())
}

async fn load_details(
    connection: &mut DatabaseConnection,
    rows: Vec<Recipe>,
    viewer: Option<i32>,
) -> Result<Vec<RecipeDetails>, Error> {
    let recipe_ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
    let author_ids: Vec<i32> = rows.iter().map(|r| r.author_id).collect();

    let authors: HashMap<i32, User> = users::table
        .filter(users::id.eq_any(&author_ids))
        .select(User::as_select())
        .load(connection)
        .await?
        .into_iter()
        .map(|user| (user.id, user))
        .collect();
    let subscribed =
        subscribed_author_ids(connection, viewer, &author_ids).await?;

    let mut tags_by_recipe: HashMap<i32, Vec<Tag>> = HashMap::new();
    let tag_rows: Vec<(i32, Tag)> = recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq_any(&recipe_ids))
        .order(tags::name.asc())
        .select((recipe_tags::recipe_id, Tag::as_select()))
        .load(connection)
        .await?;
    for (recipe_id, tag) in tag_rows {
        tags_by_recipe.entry(recipe_id).or_default().push(tag);
    }

    let mut ingredients_by_recipe: HashMap<i32, Vec<RecipeIngredientRow>> =
        HashMap::new();
    let ingredient_rows: Vec<(i32, i32, String, String, i32)> =
        recipe_ingredients::table
            .inner_join(
                ingredient_amounts::table.inner_join(ingredients::table),
            )
            .filter(recipe_ingredients::recipe_id.eq_any(&recipe_ids))
            .order(ingredients::name.asc())
            .select((
                recipe_ingredients::recipe_id,
                ingredients::id,
                ingredients::name,
                ingredients::measurement_unit,
                ingredient_amounts::amount,
            ))
            .load(connection)
            .await?;
    for (recipe_id, id, name, measurement_unit, amount) in ingredient_rows {
        ingredients_by_recipe
            .entry(recipe_id)
            .or_default()
            .push(RecipeIngredientRow {
                id,
                name,
                measurement_unit,
                amount,
            });
    }

    let (favorited, in_cart) = match viewer {
        Some(viewer) => {
            let favorited: HashSet<i32> = favorites::table
                .filter(favorites::user_id.eq(viewer))
                .filter(favorites::recipe_id.eq_any(&recipe_ids))
                .select(favorites::recipe_id)
                .load::<i32>(connection)
                .await?
                .into_iter()
                .collect();
            let in_cart: HashSet<i32> = shopping_cart::table
                .filter(shopping_cart::user_id.eq(viewer))
                .filter(shopping_cart::recipe_id.eq_any(&recipe_ids))
                .select(shopping_cart::recipe_id)
                .load::<i32>(connection)
                .await?
                .into_iter()
                .collect();
            (favorited, in_cart)
        }
        None => (HashSet::new(), HashSet::new()),
    };

    rows.into_iter()
        .map(|recipe| {
            let author =
                authors.get(&recipe.author_id).cloned().ok_or(Error::NotFound)?;
            Ok(RecipeDetails {
                author_subscribed: subscribed.contains(&author.id),
                author,
                tags: tags_by_recipe.remove(&recipe.id).unwrap_or_default(),
                ingredients: ingredients_by_recipe
                    .remove(&recipe.id)
                    .unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.id),
                is_in_shopping_cart: in_cart.contains(&recipe.id),
                recipe,
            })
        })
        .collect()
}

/// Stores a validated recipe with its ingredient and tag links in one
/// transaction and returns the new id.
#[tracing::instrument(
    name = "Inserting recipe into database.",
    skip(connection, draft)
)]
pub async fn insert_recipe(
    connection: &mut DatabaseConnection,
    author_id: i32,
    draft: &RecipeDraft,
    image_path: &str,
) -> Result<i32, Error> {
    connection
        .transaction::<_, Error, _>(|conn| {
            async move {
                let recipe_id = diesel::insert_into(recipes::table)
                    .values(&NewRecipe {
                        author_id,
                        name: &draft.name,
                        image: image_path,
                        text: &draft.text,
                        cooking_time: draft.cooking_time,
                        pub_date: Utc::now(),
                    })
                    .returning(recipes::id)
                    .get_result::<i32>(conn)
                    .await?;
                link_ingredients(conn, recipe_id, &draft.ingredients).await?;
                link_tags(conn, recipe_id, &draft.tags).await?;
                Ok(recipe_id)
            }
            .scope_boxed()
        })
        .await
        .map(|recipe_id| {
            tracing::info!(recipe_id, "New recipe has been saved.");
            recipe_id
        })
}

#[tracing::instrument(name = "Updating recipe.", skip(connection, patch))]
pub async fn update_recipe(
    connection: &mut DatabaseConnection,
    recipe_id: i32,
    patch: &RecipePatch,
    image_path: Option<&str>,
) -> Result<(), Error> {
    connection
        .transaction::<_, Error, _>(|conn| {
            async move {
                let changeset = RecipeChangeset {
                    name: patch.name.as_deref(),
                    image: image_path,
                    text: patch.text.as_deref(),
                    cooking_time: patch.cooking_time,
                };
                if !changeset.is_empty() {
                    diesel::update(recipes::table.find(recipe_id))
                        .set(&changeset)
                        .execute(conn)
                        .await?;
                }
                if let Some(ingredients) = &patch.ingredients {
                    diesel::delete(
                        recipe_ingredients::table
                            .filter(recipe_ingredients::recipe_id.eq(recipe_id)),
                    )
                    .execute(conn)
                    .await?;
                    link_ingredients(conn, recipe_id, ingredients).await?;
                }
                if let Some(tags) = &patch.tags {
                    diesel::delete(
                        recipe_tags::table
                            .filter(recipe_tags::recipe_id.eq(recipe_id)),
                    )
                    .execute(conn)
                    .await?;
                    link_tags(conn, recipe_id, tags).await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
}

/// Deletes a recipe after removing the favorites, cart entries and links
/// that reference it. Ingredients and tags are left alone. Returns the
/// image path of the removed recipe, or `None` when there was no such
/// recipe.
#[tracing::instrument(name = "Deleting recipe.", skip(connection))]
pub async fn delete_recipe(
    connection: &mut DatabaseConnection,
    recipe_id: i32,
) -> Result<Option<String>, Error> {
    connection
        .transaction::<_, Error, _>(|conn| {
            async move {
                diesel::delete(
                    favorites::table.filter(favorites::recipe_id.eq(recipe_id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(
                    shopping_cart::table
                        .filter(shopping_cart::recipe_id.eq(recipe_id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(
                    recipe_ingredients::table
                        .filter(recipe_ingredients::recipe_id.eq(recipe_id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(
                    recipe_tags::table
                        .filter(recipe_tags::recipe_id.eq(recipe_id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(recipes::table.find(recipe_id))
                    .returning(recipes::image)
                    .get_result::<String>(conn)
                    .await
                    .optional()
            }
            .scope_boxed()
        })
        .await
}

/// Links each (ingredient, amount) pair, reusing an existing
/// `ingredient_amounts` row when one matches.
async fn link_ingredients(
    connection: &mut DatabaseConnection,
    recipe_id: i32,
    quantities: &[IngredientQuantity],
) -> Result<(), Error> {
    let mut links = Vec::with_capacity(quantities.len());
    for quantity in quantities {
        let ingredient_amount_id = diesel::insert_into(ingredient_amounts::table)
            .values(&NewIngredientAmount {
                ingredient_id: quantity.ingredient_id,
                amount: quantity.amount,
            })
            .on_conflict((
                ingredient_amounts::ingredient_id,
                ingredient_amounts::amount,
            ))
            .do_update()
            .set(ingredient_amounts::amount.eq(excluded(ingredient_amounts::amount)))
            .returning(ingredient_amounts::id)
            .get_result::<i32>(connection)
            .await?;
        links.push(RecipeIngredientLink {
            recipe_id,
            ingredient_amount_id,
        });
    }
    diesel::insert_into(recipe_ingredients::table)
        .values(&links)
        .on_conflict_do_nothing()
        .execute(connection)
        .await?;
    Ok(())
}

async fn link_tags(
    connection: &mut DatabaseConnection,
    recipe_id: i32,
    tag_ids: &[i32],
) -> Result<(), Error> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    let links: Vec<RecipeTagLink> = tag_ids
        .iter()
        .map(|&tag_id| RecipeTagLink { recipe_id, tag_id })
        .collect();
    diesel::insert_into(recipe_tags::table)
        .values(&links)
        .on_conflict_do_nothing()
        .execute(connection)
        .await?;
    Ok(())
}
