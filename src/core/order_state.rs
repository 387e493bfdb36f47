//! Order state machine.
//!
//! Defines the legal lifecycle edges and applies a transition to an order model
//! without touching the database or reading a clock. Persistence of the result
//! lives in [`crate::core::order`].
//!
//! ```text
//! PendingPayment     -> ToBeConfirmed | Cancelled
//! ToBeConfirmed      -> Confirmed | Cancelled
//! Confirmed          -> DeliveryInProgress
//! DeliveryInProgress -> Completed
//! ```

use crate::{
    entities::{OrderStatus, order},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};

impl OrderStatus {
    /// Whether `self -> target` is an edge of the lifecycle.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::PendingPayment, Self::ToBeConfirmed | Self::Cancelled)
                | (Self::ToBeConfirmed, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::DeliveryInProgress)
                | (Self::DeliveryInProgress, Self::Completed)
        )
    }

    /// Completed and Cancelled orders never change again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Computes the order that results from moving `order` to `target`.
///
/// The input is never modified; on error the caller still holds the untouched
/// order. Entering `Cancelled` requires a non-blank `reason` and stamps
/// `cancel_reason`/`cancel_time`; entering `ToBeConfirmed` stamps `checkout_time`
/// and entering `Completed` stamps `delivery_time`. Every other field is carried
/// over as-is.
///
/// # Errors
/// - [`Error::InvalidTransition`] if the edge is not in the lifecycle table
/// - [`Error::Validation`] if cancelling without a reason
pub fn apply_transition(
    order: &order::Model,
    target: OrderStatus,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<order::Model> {
    if !order.status.can_transition_to(target) {
        return Err(Error::InvalidTransition {
            from: order.status,
            to: target,
        });
    }

    let mut next = order.clone();
    next.status = target;

    match target {
        OrderStatus::Cancelled => {
            let reason = reason
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or_else(|| Error::Validation {
                    message: "A cancel reason is required".to_string(),
                })?;
            next.cancel_reason = Some(reason.to_string());
            next.cancel_time = Some(now);
        }
        OrderStatus::Completed => next.delivery_time = Some(now),
        OrderStatus::ToBeConfirmed => next.checkout_time = Some(now),
        OrderStatus::PendingPayment | OrderStatus::Confirmed | OrderStatus::DeliveryInProgress => {}
    }

    Ok(next)
}
