//! Unified error type for the order desk.
//!
//! Business-rule violations (`DeletionBlocked`, `EnableBlocked`) are expected and
//! user-facing; `InvalidTransition` is a caller error; `Database` wraps any
//! storage failure and is propagated untouched.

use crate::entities::OrderStatus;
use std::fmt;
use thiserror::Error;

/// Why a catalog deletion was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionBlockedReason {
    /// At least one row in the batch is still enabled.
    OnSale,
    /// At least one dish in the batch is part of a combo.
    ReferencedByCombo,
}

impl fmt::Display for DeletionBlockedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnSale => f.write_str("item is on sale"),
            Self::ReferencedByCombo => f.write_str("dish is part of a combo"),
        }
    }
}

/// Why a combo could not be enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnableBlockedReason {
    /// The combo contains a dish that is currently disabled.
    ContainsDisabledDish,
}

impl fmt::Display for EnableBlockedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainsDisabledDish => f.write_str("combo contains a disabled dish"),
        }
    }
}

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded or parsed
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable cause
        message: String,
    },

    /// Input failed validation before anything was written
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable cause
        message: String,
    },

    /// The requested order status change is not an edge of the lifecycle
    #[error("Invalid order transition from {from:?} to {to:?}")]
    InvalidTransition {
        /// Status the order was in
        from: OrderStatus,
        /// Status that was requested
        to: OrderStatus,
    },

    /// The order changed underneath us; the conditional update matched no row
    #[error("Order {order_id} is no longer in status {expected:?}")]
    OrderStateConflict {
        /// Order that was being transitioned
        order_id: i64,
        /// Status the update expected to find
        expected: OrderStatus,
    },

    /// A catalog delete was refused
    #[error("Deletion not allowed: {reason}")]
    DeletionBlocked {
        /// Which rule blocked it
        reason: DeletionBlockedReason,
    },

    /// A combo could not be put on sale
    #[error("Enable not allowed: {reason}")]
    EnableBlocked {
        /// Which rule blocked it
        reason: EnableBlockedReason,
    },

    #[error("Order not found: {id}")]
    #[allow(missing_docs)]
    OrderNotFound { id: i64 },

    #[error("Dish not found: {id}")]
    #[allow(missing_docs)]
    DishNotFound { id: i64 },

    #[error("Combo not found: {id}")]
    #[allow(missing_docs)]
    ComboNotFound { id: i64 },

    /// Storage layer failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure, e.g. creating the database directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
