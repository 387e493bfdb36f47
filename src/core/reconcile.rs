//! Order reconciliation sweeps.
//!
//! Each sweep selects candidate orders, drives each one through the state machine
//! and persists it with the conditional update from [`crate::core::order`]. Orders
//! are processed independently: a failure on one is logged and counted, and the
//! sweep carries on. Both sweeps take `now` explicitly so they can be run
//! out-of-band and in tests without a live clock.

use crate::{
    core::{order::find_orders, order::save_transition, order_state::apply_transition},
    entities::{OrderStatus, order},
    errors::{Error, Result},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::ConnectionTrait;
use tracing::{info, instrument, warn};

/// Cancel reason recorded by the timeout sweep
pub const TIMEOUT_CANCEL_REASON: &str = "order timed out, auto-cancelled";

/// Outcome of one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Number of orders selected as candidates
    pub candidates: usize,
    /// Orders that were transitioned and persisted
    pub transitioned: Vec<i64>,
    /// Orders another writer moved between select and update
    pub skipped: Vec<i64>,
    /// Orders whose transition failed, with the error message
    pub failed: Vec<(i64, String)>,
}

impl SweepReport {
    /// No order failed; conflicts and skips do not count as failures.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Cancels every `PendingPayment` order placed at or before `now - timeout`.
///
/// # Errors
/// Only the candidate query can fail the sweep; per-order failures are reported in
/// the returned [`SweepReport`].
#[instrument(skip(db))]
pub async fn sweep_timed_out_orders<C>(
    db: &C,
    now: DateTime<Utc>,
    timeout: Duration,
) -> Result<SweepReport>
where
    C: ConnectionTrait,
{
    let candidates = find_orders(db, OrderStatus::PendingPayment, now - timeout).await?;
    let report = run_sweep(
        db,
        candidates,
        OrderStatus::Cancelled,
        Some(TIMEOUT_CANCEL_REASON),
        now,
    )
    .await;

    info!(
        candidates = report.candidates,
        cancelled = report.transitioned.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Timeout sweep finished"
    );
    Ok(report)
}

/// Completes every `DeliveryInProgress` order placed at or before `now - threshold`.
///
/// The threshold is measured from `order_time`, not from when delivery started.
#[instrument(skip(db))]
pub async fn sweep_stuck_deliveries<C>(
    db: &C,
    now: DateTime<Utc>,
    threshold: Duration,
) -> Result<SweepReport>
where
    C: ConnectionTrait,
{
    let candidates = find_orders(db, OrderStatus::DeliveryInProgress, now - threshold).await?;
    let report = run_sweep(db, candidates, OrderStatus::Completed, None, now).await;

    info!(
        candidates = report.candidates,
        completed = report.transitioned.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "Stuck-delivery sweep finished"
    );
    Ok(report)
}

async fn run_sweep<C>(
    db: &C,
    candidates: Vec<order::Model>,
    target: OrderStatus,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> SweepReport
where
    C: ConnectionTrait,
{
    let mut report = SweepReport {
        candidates: candidates.len(),
        ..SweepReport::default()
    };

    for current in candidates {
        let outcome = match apply_transition(&current, target, reason, now) {
            Ok(next) => save_transition(db, &current, &next).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => report.transitioned.push(current.id),
            Err(Error::OrderStateConflict { .. }) => {
                info!(order_id = current.id, "Order changed during sweep, skipping");
                report.skipped.push(current.id);
            }
            Err(e) => {
                warn!(order_id = current.id, error = %e, "Failed to reconcile order");
                report.failed.push((current.id, e.to_string()));
            }
        }
    }

    report
}
