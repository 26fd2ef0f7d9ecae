use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Reference data, populated once and never mutated by end users.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ingredient_amount::Entity")]
    IngredientAmounts,
}

impl Related<super::ingredient_amount::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IngredientAmounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
