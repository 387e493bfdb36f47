//! Combo entity - A bundle of dishes sold as one unit.
//!
//! The composition lives in `combo_items`. A combo may only be enabled while
//! every dish it contains is enabled; see [`crate::core::combo::set_combo_status`].

use super::catalog_status::CatalogStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Combo database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "combos")]
pub struct Model {
    /// Unique identifier for the combo
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Menu category the combo is listed under
    pub category_id: i64,
    /// Display name (e.g., "Family Feast")
    pub name: String,
    /// Bundle price
    pub price: f64,
    /// Whether the combo is on sale
    pub status: CatalogStatus,
    /// Free-text description
    pub description: String,
    /// Image location
    pub image: String,
    /// When the combo was created
    pub create_time: DateTime,
    /// When the combo was last modified
    pub update_time: DateTime,
    /// Staff member who created the combo
    pub create_user: i64,
    /// Staff member who last modified the combo
    pub update_user: i64,
}

/// Defines relationships between Combo and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One combo is composed of many items
    #[sea_orm(has_many = "super::combo_item::Entity")]
    Items,
}

impl Related<super::combo_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
