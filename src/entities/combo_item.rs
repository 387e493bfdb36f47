//! Combo item entity - Links a combo to one of its dishes with a number of copies.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Combo item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "combo_items")]
pub struct Model {
    /// Unique identifier for the item
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning combo
    pub combo_id: i64,
    /// Referenced dish
    pub dish_id: i64,
    /// Dish name as shown inside the combo
    pub name: String,
    /// Dish price as listed inside the combo
    pub price: f64,
    /// How many of the dish the combo contains
    pub copies: i32,
}

/// Defines relationships between ComboItem and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one combo
    #[sea_orm(
        belongs_to = "super::combo::Entity",
        from = "Column::ComboId",
        to = "super::combo::Column::Id"
    )]
    Combo,
    /// Each item references one dish
    #[sea_orm(
        belongs_to = "super::dish::Entity",
        from = "Column::DishId",
        to = "super::dish::Column::Id"
    )]
    Dish,
}

impl Related<super::combo::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Combo.def()
    }
}

impl Related<super::dish::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dish.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
