//! Dish entity - A single sellable menu item.
//!
//! Dishes own their flavor rows and may be referenced by any number of combos
//! through `combo_items`. Audit columns are stamped explicitly by the caller.

use super::catalog_status::CatalogStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Dish database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "dishes")]
pub struct Model {
    /// Unique identifier for the dish
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Kung Pao Chicken")
    pub name: String,
    /// Menu category the dish is listed under
    pub category_id: i64,
    /// Unit price
    pub price: f64,
    /// Image location
    pub image: String,
    /// Free-text description
    pub description: String,
    /// Whether the dish is on sale
    pub status: CatalogStatus,
    /// When the dish was created
    pub create_time: DateTime,
    /// When the dish was last modified
    pub update_time: DateTime,
    /// Staff member who created the dish
    pub create_user: i64,
    /// Staff member who last modified the dish
    pub update_user: i64,
}

/// Defines relationships between Dish and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One dish has many flavor options
    #[sea_orm(has_many = "super::dish_flavor::Entity")]
    Flavors,
    /// One dish can appear in many combo items
    #[sea_orm(has_many = "super::combo_item::Entity")]
    ComboItems,
}

impl Related<super::dish_flavor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Flavors.def()
    }
}

impl Related<super::combo_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ComboItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
