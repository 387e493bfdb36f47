//! Dish flavor entity - One selectable flavor group of a dish (e.g. spice level).
//!
//! `value` holds the options as the client sends them (typically a JSON array string).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dish flavor database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dish_flavors")]
pub struct Model {
    /// Unique identifier for the flavor row
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning dish
    pub dish_id: i64,
    /// Flavor group name (e.g., "Spiciness")
    pub name: String,
    /// Available options
    pub value: String,
}

/// Defines relationships between DishFlavor and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each flavor belongs to one dish
    #[sea_orm(
        belongs_to = "super::dish::Entity",
        from = "Column::DishId",
        to = "super::dish::Column::Id"
    )]
    Dish,
}

impl Related<super::dish::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dish.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
