/// Database configuration and connection management
pub mod database;

/// Reconciliation settings loading from config.toml
pub mod settings;
