//! Database configuration module.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs without hand-written SQL.

use crate::entities::{CartLine, Combo, ComboItem, Dish, DishFlavor, Order};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/order_desk.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable or returns
/// the default local `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Parent directory of a file-backed `SQLite` URL, if it has one.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    Path::new(path).parent().filter(|p| !p.as_os_str().is_empty())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// For file-backed `SQLite` the parent directory is created first.
#[instrument]
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables from the entity definitions.
///
/// Parents are created before children so foreign keys resolve: dishes before
/// flavors and combo items, combos before combo items.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = vec![
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(Dish),
        schema.create_table_from_entity(DishFlavor),
        schema.create_table_from_entity(Combo),
        schema.create_table_from_entity(ComboItem),
        schema.create_table_from_entity(CartLine),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    info!("Database tables ensured.");
    Ok(())
}
