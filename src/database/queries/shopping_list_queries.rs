use crate::{
    database::DatabaseConnection,
    domain::CartIngredient,
    schema::{ingredient_amounts, ingredients, recipe_ingredients, shopping_cart},
};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

/// Every ingredient quantity of every recipe in the user's cart, in cart
/// insertion order and then by ingredient name.
#[tracing::instrument(name = "Loading cart ingredients", skip(connection))]
pub async fn cart_ingredients(
    connection: &mut DatabaseConnection,
    user_id: i32,
) -> Result<Vec<CartIngredient>, diesel::result::Error> {
    let rows: Vec<(String, String, i32)> = recipe_ingredients::table
        .inner_join(ingredient_amounts::table.inner_join(ingredients::table))
        .inner_join(
            shopping_cart::table
                .on(shopping_cart::recipe_id.eq(recipe_ingredients::recipe_id)),
        )
        .filter(shopping_cart::user_id.eq(user_id))
        .order((shopping_cart::id.asc(), ingredients::name.asc()))
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            ingredient_amounts::amount,
        ))
        .load(connection)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(name, measurement_unit, amount)| CartIngredient {
            name,
            measurement_unit,
            amount,
        })
        .collect())
}
