use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Binds a recipe to one ingredient line. Keeps its own `id` so a recipe's
/// lines have a stable order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe_ingredients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub recipe_id: i32,
    pub ingredient_amount_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::recipe::Entity",
        from = "Column::RecipeId",
        to = "super::recipe::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade"
    )]
    Recipe,
    #[sea_orm(
        belongs_to = "super::ingredient_amount::Entity",
        from = "Column::IngredientAmountId",
        to = "super::ingredient_amount::Column::Id",
        on_delete = "Cascade",
        on_update = "Cascade"
    )]
    IngredientAmount,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl Related<super::ingredient_amount::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientAmount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
