//! Cart line entity - One row of a user's shopping cart.
//!
//! Exactly one of `dish_id` / `combo_id` is set. `name`, `image` and `unit_price`
//! are a snapshot taken when the line was first added and are never refreshed
//! from the catalog; the table has no foreign keys.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cart line database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cart_lines")]
pub struct Model {
    /// Unique identifier for the line; ascending ids give insertion order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Cart owner
    pub user_id: i64,
    /// Dish in this line, if the line is for a dish
    pub dish_id: Option<i64>,
    /// Flavor selection for the dish, if any
    pub dish_flavor: Option<String>,
    /// Combo in this line, if the line is for a combo
    pub combo_id: Option<i64>,
    /// Snapshot of the product name
    pub name: String,
    /// Snapshot of the product image
    pub image: String,
    /// Snapshot of the product price
    pub unit_price: f64,
    /// Number of units; always at least 1
    pub quantity: i32,
    /// When the line was first added
    pub create_time: DateTimeUtc,
}

/// Cart lines hold snapshots, not live references
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
