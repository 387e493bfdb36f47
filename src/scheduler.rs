//! Periodic driver for the reconciliation sweeps.
//!
//! The timeout sweep fires on every wall-clock minute boundary and the delivery
//! sweep once a day at a configured UTC time. Each run is spawned as its own task
//! with a fresh `now`, so a slow run never delays the next tick; sweeps are
//! idempotent, so overlapping runs are safe.

use crate::{
    config::settings::ReconcileSettings,
    core::reconcile::{SweepReport, sweep_stuck_deliveries, sweep_timed_out_orders},
    errors::Result,
};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use sea_orm::DatabaseConnection;
use std::{future::Future, sync::Arc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Start of the next whole minute strictly after `now`.
#[must_use]
pub fn next_minute_boundary(now: DateTime<Utc>) -> DateTime<Utc> {
    let next = (now.timestamp().div_euclid(60) + 1) * 60;
    DateTime::from_timestamp(next, 0).unwrap_or(now + Duration::minutes(1))
}

/// Next occurrence of `at` (UTC) strictly after `now`.
#[must_use]
pub fn next_daily_run(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Handles of the two running sweep loops.
#[derive(Debug)]
pub struct SweepHandles {
    /// Payment-timeout loop
    pub timeout: JoinHandle<()>,
    /// Stuck-delivery loop
    pub delivery: JoinHandle<()>,
}

impl SweepHandles {
    /// Stops both loops. Runs already in flight finish on their own.
    pub fn shutdown(self) {
        self.timeout.abort();
        self.delivery.abort();
        info!("Reconciliation scheduler stopped.");
    }
}

fn spawn_periodic<N, J, Fut>(name: &'static str, next_run: N, job: J) -> JoinHandle<()>
where
    N: Fn(DateTime<Utc>) -> DateTime<Utc> + Send + 'static,
    J: Fn(DateTime<Utc>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<SweepReport>> + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let now = Utc::now();
            let next = next_run(now);
            debug!(sweep = name, next = %next, "Sleeping until next run");
            tokio::time::sleep((next - now).to_std().unwrap_or_default()).await;

            let run = job(Utc::now());
            tokio::spawn(async move {
                match run.await {
                    Ok(report) if report.is_clean() => {}
                    Ok(report) => {
                        error!(sweep = name, failed = ?report.failed, "Sweep finished with failures");
                    }
                    Err(e) => error!(sweep = name, error = %e, "Sweep could not select candidates"),
                }
            });
        }
    })
}

/// Starts both sweep loops on the current tokio runtime.
///
/// Each loop and each run holds its own handle on the shared connection.
///
/// # Errors
/// Returns [`crate::errors::Error::Config`] if the delivery sweep time is malformed.
pub fn start(db: &Arc<DatabaseConnection>, settings: &ReconcileSettings) -> Result<SweepHandles> {
    let timeout = settings.payment_timeout();
    let threshold = settings.stuck_delivery_threshold();
    let sweep_at = settings.delivery_sweep_time()?;

    let timeout_db = Arc::clone(db);
    let timeout_handle = spawn_periodic("timeout-cancel", next_minute_boundary, move |now| {
        let db = Arc::clone(&timeout_db);
        async move { sweep_timed_out_orders(&*db, now, timeout).await }
    });

    let delivery_db = Arc::clone(db);
    let delivery_handle = spawn_periodic(
        "stuck-delivery",
        move |now| next_daily_run(now, sweep_at),
        move |now| {
            let db = Arc::clone(&delivery_db);
            async move { sweep_stuck_deliveries(&*db, now, threshold).await }
        },
    );

    info!(
        payment_timeout_minutes = settings.payment_timeout_minutes,
        stuck_delivery_hours = settings.stuck_delivery_hours,
        delivery_sweep_at = %settings.delivery_sweep_at,
        "Reconciliation scheduler started."
    );

    Ok(SweepHandles {
        timeout: timeout_handle,
        delivery: delivery_handle,
    })
}
