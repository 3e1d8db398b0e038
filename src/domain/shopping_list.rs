use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// One ingredient quantity of a recipe sitting in a shopping cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartIngredient {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Cart ingredients summed per (name, unit), in first-seen order.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ShoppingList {
    items: Vec<ShoppingListItem>,
}

impl ShoppingList {
    pub fn aggregate<I>(ingredients: I) -> Self
    where
        I: IntoIterator<Item = CartIngredient>,
    {
        let mut positions: HashMap<(String, String), usize> = HashMap::new();
        let mut items: Vec<ShoppingListItem> = Vec::new();
        for ingredient in ingredients {
            let amount = i64::from(ingredient.amount);
            match positions
                .entry((ingredient.name, ingredient.measurement_unit))
            {
                Entry::Occupied(position) => {
                    items[*position.get()].amount += amount;
                }
                Entry::Vacant(position) => {
                    let (name, measurement_unit) = position.key().clone();
                    items.push(ShoppingListItem {
                        name,
                        measurement_unit,
                        amount,
                    });
                    position.insert(items.len() - 1);
                }
            }
        }
        Self { items }
    }

    pub fn items(&self) -> &[ShoppingListItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn render(&self) -> String {
        self.items
            .iter()
            .map(|item| {
                format!(
                    "• {} ({}) — {}\n",
                    item.name, item.measurement_unit, item.amount
                )
            })
            .collect()
    }
}

pub fn shopping_list_filename(username: &str) -> String {
    format!("{} shopping cart.txt", username)
}
