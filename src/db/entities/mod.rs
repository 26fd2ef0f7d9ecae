//! SeaORM entities, one module per table.

pub mod cart_recipe;
pub mod favorite_recipe;
pub mod ingredient;
pub mod ingredient_amount;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod subscription;
pub mod tag;
pub mod user;

// Prelude module for easy importing of all entities and their related types
pub mod prelude {
    pub use super::user::Entity as User;
    pub use super::user::Model as UserModel;
    pub use super::user::ActiveModel as UserActiveModel;
    pub use super::user::Column as UserColumn;

    pub use super::subscription::Entity as Subscription;
    pub use super::subscription::Model as SubscriptionModel;
    pub use super::subscription::ActiveModel as SubscriptionActiveModel;
    pub use super::subscription::Column as SubscriptionColumn;

    pub use super::tag::Entity as Tag;
    pub use super::tag::Model as TagModel;
    pub use super::tag::ActiveModel as TagActiveModel;
    pub use super::tag::Column as TagColumn;

    pub use super::ingredient::Entity as Ingredient;
    pub use super::ingredient::Model as IngredientModel;
    pub use super::ingredient::ActiveModel as IngredientActiveModel;
    pub use super::ingredient::Column as IngredientColumn;

    pub use super::ingredient_amount::Entity as IngredientAmount;
    pub use super::ingredient_amount::Model as IngredientAmountModel;
    pub use super::ingredient_amount::ActiveModel as IngredientAmountActiveModel;
    pub use super::ingredient_amount::Column as IngredientAmountColumn;

    pub use super::recipe::Entity as Recipe;
    pub use super::recipe::Model as RecipeModel;
    pub use super::recipe::ActiveModel as RecipeActiveModel;
    pub use super::recipe::Column as RecipeColumn;

    pub use super::recipe_tag::Entity as RecipeTag;
    pub use super::recipe_tag::Model as RecipeTagModel;
    pub use super::recipe_tag::ActiveModel as RecipeTagActiveModel;
    pub use super::recipe_tag::Column as RecipeTagColumn;

    pub use super::recipe_ingredient::Entity as RecipeIngredient;
    pub use super::recipe_ingredient::Model as RecipeIngredientModel;
    pub use super::recipe_ingredient::ActiveModel as RecipeIngredientActiveModel;
    pub use super::recipe_ingredient::Column as RecipeIngredientColumn;

    pub use super::favorite_recipe::Entity as FavoriteRecipe;
    pub use super::favorite_recipe::Model as FavoriteRecipeModel;
    pub use super::favorite_recipe::ActiveModel as FavoriteRecipeActiveModel;
    pub use super::favorite_recipe::Column as FavoriteRecipeColumn;

    pub use super::cart_recipe::Entity as CartRecipe;
    pub use super::cart_recipe::Model as CartRecipeModel;
    pub use super::cart_recipe::ActiveModel as CartRecipeActiveModel;
    pub use super::cart_recipe::Column as CartRecipeColumn;
}
