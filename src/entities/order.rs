//! Order entity - A customer order moving through its lifecycle.
//!
//! `status` only ever moves forward along the edges defined in
//! [`crate::core::order_state`]. `cancel_reason` and `cancel_time` are populated
//! exactly when the order is `Cancelled`. Orders are never deleted by this crate.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum OrderStatus {
    /// Created by checkout, waiting for payment
    #[sea_orm(num_value = 1)]
    PendingPayment,
    /// Paid, waiting for the merchant
    #[sea_orm(num_value = 2)]
    ToBeConfirmed,
    /// Accepted by the merchant
    #[sea_orm(num_value = 3)]
    Confirmed,
    /// Out for delivery
    #[sea_orm(num_value = 4)]
    DeliveryInProgress,
    /// Delivered (terminal)
    #[sea_orm(num_value = 5)]
    Completed,
    /// Cancelled (terminal)
    #[sea_orm(num_value = 6)]
    Cancelled,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Customer-facing order number
    pub number: String,
    /// User who placed the order
    pub user_id: i64,
    /// Current lifecycle status
    pub status: OrderStatus,
    /// Order total
    pub amount: f64,
    /// When the order was created; never changes afterwards
    pub order_time: DateTimeUtc,
    /// When payment was confirmed
    pub checkout_time: Option<DateTimeUtc>,
    /// Why the order was cancelled; set only when `status == Cancelled`
    pub cancel_reason: Option<String>,
    /// When the order was cancelled; set only when `status == Cancelled`
    pub cancel_time: Option<DateTimeUtc>,
    /// Merchant's reason when it refused the order
    pub rejection_reason: Option<String>,
    /// When the order was completed
    pub delivery_time: Option<DateTimeUtc>,
}

/// Orders reference users and order lines owned by other services; no local relations.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
