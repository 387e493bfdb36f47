#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use order_desk::{config, errors::Result, scheduler};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load reconciliation settings
    let app_config = config::settings::load_app_configuration()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!("Successfully processed application configuration.");

    // 4. Connect and ensure tables
    let db = config::database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    config::database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;
    let db = Arc::new(db);

    // 5. Run the sweeps until interrupted
    let sweeps = scheduler::start(&db, &app_config.reconcile)?;
    tokio::signal::ctrl_c()
        .await
        .inspect_err(|e| error!("Failed to listen for shutdown signal: {}", e))?;
    info!("Shutdown signal received.");
    sweeps.shutdown();

    // A sweep still in flight keeps its handle; the pool then closes on drop
    match Arc::try_unwrap(db) {
        Ok(db) => db.close().await?,
        Err(_) => info!("Sweep still running, leaving the pool to close on drop."),
    }
    Ok(())
}
