use std::collections::HashSet;

use unicode_segmentation::UnicodeSegmentation;

use crate::routes::{IngredientEntry, RecipePatchPayload, RecipePayload};

use super::recipe_image::{InvalidImage, RecipeImage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientQuantity {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// A validated recipe ready to be stored.
#[derive(Debug)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientQuantity>,
    pub tags: Vec<i32>,
    pub image: RecipeImage,
}

/// A validated partial update; `None` leaves the stored value alone.
#[derive(Debug, Default)]
pub struct RecipePatch {
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i32>,
    pub ingredients: Option<Vec<IngredientQuantity>>,
    pub tags: Option<Vec<i32>>,
    pub image: Option<RecipeImage>,
}

impl TryFrom<RecipePayload> for RecipeDraft {
    type Error = InvalidRecipe;

    fn try_from(payload: RecipePayload) -> Result<Self, Self::Error> {
        Ok(Self {
            name: parse_name(payload.name)?,
            text: parse_text(payload.text)?,
            cooking_time: parse_cooking_time(payload.cooking_time)?,
            ingredients: parse_ingredients(payload.ingredients)?,
            tags: parse_tags(payload.tags)?,
            image: RecipeImage::try_from(payload.image)?,
        })
    }
}

impl TryFrom<RecipePatchPayload> for RecipePatch {
    type Error = InvalidRecipe;

    fn try_from(payload: RecipePatchPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            name: payload.name.map(parse_name).transpose()?,
            text: payload.text.map(parse_text).transpose()?,
            cooking_time: payload
                .cooking_time
                .map(parse_cooking_time)
                .transpose()?,
            ingredients: payload
                .ingredients
                .map(parse_ingredients)
                .transpose()?,
            tags: payload.tags.map(parse_tags).transpose()?,
            image: payload.image.map(RecipeImage::try_from).transpose()?,
        })
    }
}

fn parse_name(name: String) -> Result<String, InvalidRecipe> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(InvalidRecipe::EmptyName);
    }
    if name.graphemes(true).count() > 200 {
        return Err(InvalidRecipe::NameTooLong);
    }
    Ok(name)
}

fn parse_text(text: String) -> Result<String, InvalidRecipe> {
    if text.trim().is_empty() {
        return Err(InvalidRecipe::EmptyText);
    }
    Ok(text)
}

fn parse_cooking_time(cooking_time: i32) -> Result<i32, InvalidRecipe> {
    if cooking_time < 1 {
        return Err(InvalidRecipe::CookingTime);
    }
    Ok(cooking_time)
}

fn parse_ingredients(
    entries: Vec<IngredientEntry>,
) -> Result<Vec<IngredientQuantity>, InvalidRecipe> {
    if entries.is_empty() {
        return Err(InvalidRecipe::NoIngredients);
    }
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .map(|entry| {
            if !seen.insert(entry.id) {
                return Err(InvalidRecipe::DuplicateIngredient(entry.id));
            }
            if entry.amount < 1 {
                return Err(InvalidRecipe::IngredientAmount(entry.id));
            }
            Ok(IngredientQuantity {
                ingredient_id: entry.id,
                amount: entry.amount,
            })
        })
        .collect()
}

fn parse_tags(tags: Vec<i32>) -> Result<Vec<i32>, InvalidRecipe> {
    let mut seen = HashSet::with_capacity(tags.len());
    for tag in &tags {
        if !seen.insert(*tag) {
            return Err(InvalidRecipe::DuplicateTag(*tag));
        }
    }
    Ok(tags)
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum InvalidRecipe {
    #[error("Recipe name is empty.")]
    EmptyName,
    #[error("Recipe name is too long.")]
    NameTooLong,
    #[error("Recipe text is empty.")]
    EmptyText,
    #[error("Cooking time must be at least 1 minute.")]
    CookingTime,
    #[error("A recipe needs at least one ingredient.")]
    NoIngredients,
    #[error("Ingredient {0} is listed more than once.")]
    DuplicateIngredient(i32),
    #[error("Amount of ingredient {0} must be at least 1.")]
    IngredientAmount(i32),
    #[error("Tag {0} is listed more than once.")]
    DuplicateTag(i32),
    #[error(transparent)]
    Image(#[from] InvalidImage),
}
