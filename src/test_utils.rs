//! Shared test utilities for the order desk.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults. Fixtures write rows
//! directly so tests can start from states the public API would refuse to
//! produce in one step (an enabled combo, an order already out for delivery).

use crate::{
    core::dish::DishDraft,
    entities::{CatalogStatus, Dish, OrderStatus, combo, combo_item, dish, order},
    errors::{Error, Result},
};
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use tracing_subscriber::EnvFilter;

/// Acting staff member used by fixtures
pub const ADMIN_ID: i64 = 1;

/// Category used by fixtures
pub const TEST_CATEGORY_ID: i64 = 10;

/// Installs a test-writer subscriber; safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A fixed, whole-second "now" so stored timestamps compare exactly.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Inserts an order directly in `status` with the given `order_time`.
///
/// # Defaults
/// * `user_id`: 7
/// * `amount`: 36.0
/// * cancel fields populated only for `Cancelled`
pub async fn insert_order(
    db: &DatabaseConnection,
    status: OrderStatus,
    order_time: DateTime<Utc>,
) -> Result<order::Model> {
    let cancelled = status == OrderStatus::Cancelled;
    let order = order::ActiveModel {
        number: Set(format!("T{}", order_time.timestamp())),
        user_id: Set(7),
        status: Set(status),
        amount: Set(36.0),
        order_time: Set(order_time),
        checkout_time: Set(None),
        cancel_reason: Set(cancelled.then(|| "fixture".to_string())),
        cancel_time: Set(cancelled.then_some(order_time)),
        rejection_reason: Set(None),
        delivery_time: Set(None),
        ..Default::default()
    };
    order.insert(db).await.map_err(Into::into)
}

/// Builds a dish draft with no flavors.
///
/// # Defaults
/// * `category_id`: [`TEST_CATEGORY_ID`]
/// * `image`: `"dish.png"`
#[must_use]
pub fn dish_draft(name: &str, price: f64) -> DishDraft {
    DishDraft {
        name: name.to_string(),
        category_id: TEST_CATEGORY_ID,
        price,
        image: "dish.png".to_string(),
        description: String::new(),
        flavors: Vec::new(),
    }
}

/// Inserts a dish directly with the given status.
///
/// # Defaults
/// * price: 12.0
/// * `category_id`: [`TEST_CATEGORY_ID`]
pub async fn create_test_dish(
    db: &DatabaseConnection,
    name: &str,
    status: CatalogStatus,
) -> Result<dish::Model> {
    let now = fixed_now().naive_utc();
    let dish = dish::ActiveModel {
        name: Set(name.to_string()),
        category_id: Set(TEST_CATEGORY_ID),
        price: Set(12.0),
        image: Set(format!("{}.png", name.to_lowercase().replace(' ', "_"))),
        description: Set(String::new()),
        status: Set(status),
        create_time: Set(now),
        update_time: Set(now),
        create_user: Set(ADMIN_ID),
        update_user: Set(ADMIN_ID),
        ..Default::default()
    };
    dish.insert(db).await.map_err(Into::into)
}

/// Inserts a combo directly with the given status, one copy of each dish.
///
/// Bypasses the enable check so tests can start from any combination.
pub async fn create_test_combo(
    db: &DatabaseConnection,
    name: &str,
    dish_ids: &[i64],
    status: CatalogStatus,
) -> Result<combo::Model> {
    let now = fixed_now().naive_utc();
    let combo = combo::ActiveModel {
        category_id: Set(TEST_CATEGORY_ID),
        name: Set(name.to_string()),
        price: Set(30.0),
        status: Set(status),
        description: Set(String::new()),
        image: Set("combo.png".to_string()),
        create_time: Set(now),
        update_time: Set(now),
        create_user: Set(ADMIN_ID),
        update_user: Set(ADMIN_ID),
        ..Default::default()
    }
    .insert(db)
    .await?;

    for &dish_id in dish_ids {
        let dish = Dish::find_by_id(dish_id)
            .one(db)
            .await?
            .ok_or(Error::DishNotFound { id: dish_id })?;
        combo_item::ActiveModel {
            combo_id: Set(combo.id),
            dish_id: Set(dish.id),
            name: Set(dish.name),
            price: Set(dish.price),
            copies: Set(1),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }

    Ok(combo)
}
