//! Reconciliation settings loading from config.toml
//!
//! The file is optional. Every field has a default matching the production
//! cadence: pending orders time out after 15 minutes, deliveries are closed one
//! hour after the order was placed, and the delivery sweep runs at 01:00 UTC.

use crate::errors::{Error, Result};
use chrono::{Duration, NaiveTime};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "ORDER_DESK_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Sweep thresholds and cadence
    #[serde(default)]
    pub reconcile: ReconcileSettings,
}

/// Thresholds and cadence of the two order sweeps
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReconcileSettings {
    /// Minutes an order may wait for payment before it is cancelled
    pub payment_timeout_minutes: i64,
    /// Hours after `order_time` at which an in-delivery order is closed
    pub stuck_delivery_hours: i64,
    /// Daily UTC wall-clock time of the delivery sweep, `HH:MM`
    pub delivery_sweep_at: String,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            payment_timeout_minutes: 15,
            stuck_delivery_hours: 1,
            delivery_sweep_at: "01:00".to_string(),
        }
    }
}

impl ReconcileSettings {
    /// How long an order may wait for payment before the sweep cancels it.
    #[must_use]
    pub fn payment_timeout(&self) -> Duration {
        Duration::minutes(self.payment_timeout_minutes)
    }

    /// Age after which an in-delivery order is completed by the sweep.
    #[must_use]
    pub fn stuck_delivery_threshold(&self) -> Duration {
        Duration::hours(self.stuck_delivery_hours)
    }

    /// Parses `delivery_sweep_at`.
    pub fn delivery_sweep_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.delivery_sweep_at, "%H:%M").map_err(|e| Error::Config {
            message: format!(
                "Invalid delivery_sweep_at '{}' (expected HH:MM): {e}",
                self.delivery_sweep_at
            ),
        })
    }

    /// Rejects thresholds that would make the sweeps meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.payment_timeout_minutes <= 0 {
            return Err(Error::Config {
                message: "payment_timeout_minutes must be positive".to_string(),
            });
        }
        if self.stuck_delivery_hours <= 0 {
            return Err(Error::Config {
                message: "stuck_delivery_hours must be positive".to_string(),
            });
        }
        self.delivery_sweep_time().map(|_| ())
    }
}

/// Loads and validates configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A threshold is not positive or the sweep time is malformed
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    debug!("Loading configuration from {:?}", path.as_ref());
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_config(&contents)
}

fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.reconcile.validate()?;
    Ok(config)
}

/// Loads configuration from `$ORDER_DESK_CONFIG` or `./config.toml`.
///
/// A missing file is not an error; defaults are used instead.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if !Path::new(&path).exists() {
        info!("No configuration file at {}, using defaults.", path);
        return Ok(AppConfig::default());
    }
    load_config(&path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_defaults_match_production_cadence() {
        let settings = ReconcileSettings::default();
        assert_eq!(settings.payment_timeout(), Duration::minutes(15));
        assert_eq!(settings.stuck_delivery_threshold(), Duration::hours(1));
        assert_eq!(
            settings.delivery_sweep_time().unwrap(),
            NaiveTime::from_hms_opt(1, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_partial_reconcile_section() {
        let toml_str = r#"
            [reconcile]
            payment_timeout_minutes = 30
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.reconcile.payment_timeout_minutes, 30);
        assert_eq!(config.reconcile.stuck_delivery_hours, 1);
        assert_eq!(config.reconcile.delivery_sweep_at, "01:00");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.reconcile, ReconcileSettings::default());
    }

    #[test]
    fn test_rejects_bad_sweep_time() {
        let toml_str = r#"
            [reconcile]
            delivery_sweep_at = "25:99"
        "#;

        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_non_positive_timeout() {
        let toml_str = r#"
            [reconcile]
            payment_timeout_minutes = 0
        "#;

        assert!(matches!(parse_config(toml_str), Err(Error::Config { .. })));
    }
}
