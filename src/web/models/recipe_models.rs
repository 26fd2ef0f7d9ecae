use serde::{Deserialize, Serialize};

use crate::db::entities::{recipe, tag};
use crate::db::services::{IngredientEntry, NewRecipe, RecipeDetails, RecipeUpdate};

use super::UserResponse;

#[derive(Debug, Deserialize)]
pub struct IngredientAmountInput {
    /// Ingredient id in the catalog.
    pub id: i32,
    pub amount: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tags: Vec<i32>,
    pub ingredients: Vec<IngredientAmountInput>,
}

impl From<CreateRecipeRequest> for NewRecipe {
    fn from(req: CreateRecipeRequest) -> Self {
        NewRecipe {
            name: req.name,
            text: req.text,
            image: req.image,
            cooking_time: req.cooking_time,
            tag_ids: req.tags,
            ingredients: req
                .ingredients
                .into_iter()
                .map(|i| IngredientEntry {
                    ingredient_id: i.id,
                    amount: i.amount,
                })
                .collect(),
        }
    }
}

/// Absent fields leave the recipe unchanged; a present `tags` or
/// `ingredients` list replaces the links wholesale.
#[derive(Debug, Deserialize)]
pub struct UpdateRecipeRequest {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<IngredientAmountInput>>,
}

impl From<UpdateRecipeRequest> for RecipeUpdate {
    fn from(req: UpdateRecipeRequest) -> Self {
        RecipeUpdate {
            name: req.name,
            text: req.text,
            image: req.image,
            cooking_time: req.cooking_time,
            tag_ids: req.tags,
            ingredients: req.ingredients.map(|list| {
                list.into_iter()
                    .map(|i| IngredientEntry {
                        ingredient_id: i.id,
                        amount: i.amount,
                    })
                    .collect()
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

impl From<tag::Model> for TagResponse {
    fn from(model: tag::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
        }
    }
}

/// Flattened ingredient line: catalog fields plus the recipe's amount.
#[derive(Debug, Serialize)]
pub struct IngredientLineResponse {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub id: i32,
    pub author: UserResponse,
    pub name: String,
    pub text: String,
    pub image: String,
    pub cooking_time: i32,
    pub tags: Vec<TagResponse>,
    pub ingredients: Vec<IngredientLineResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeResponse {
    pub fn from_details(
        details: RecipeDetails,
        author_subscribed: bool,
        is_favorited: bool,
        is_in_shopping_cart: bool,
    ) -> Self {
        Self {
            id: details.recipe.id,
            author: UserResponse::from_model(&details.author, author_subscribed),
            name: details.recipe.name,
            text: details.recipe.text,
            image: details.recipe.image,
            cooking_time: details.recipe.cooking_time,
            tags: details.tags.into_iter().map(TagResponse::from).collect(),
            ingredients: details
                .ingredients
                .into_iter()
                .map(|(ingredient, amount)| IngredientLineResponse {
                    id: ingredient.id,
                    name: ingredient.name,
                    measurement_unit: ingredient.measurement_unit,
                    amount,
                })
                .collect(),
            is_favorited,
            is_in_shopping_cart,
        }
    }
}

/// Abridged recipe form used by favorite/cart responses and subscription
/// listings.
#[derive(Debug, Serialize)]
pub struct ShortRecipeResponse {
    pub id: i32,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<recipe::Model> for ShortRecipeResponse {
    fn from(model: recipe::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            image: model.image,
            cooking_time: model.cooking_time,
        }
    }
}

/// A followed author with their recipes in short form.
#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub recipes: Vec<ShortRecipeResponse>,
    pub recipes_count: usize,
}
