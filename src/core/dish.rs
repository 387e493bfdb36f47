//! Dish business logic - Catalog management and the dish side of the integrity guard.
//!
//! Dishes are created off sale together with their flavor rows. Deleting is only
//! possible for a batch in which every dish is off sale and none is part of any
//! combo; the checks and the delete run in one database transaction, so either the
//! whole batch goes or nothing does. Changing a dish's sale status never cascades to
//! the combos that contain it.

use crate::{
    entities::{CatalogStatus, ComboItem, Dish, DishFlavor, combo_item, dish, dish_flavor},
    errors::{DeletionBlockedReason, Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveEnum, DatabaseTransaction, PaginatorTrait, QueryOrder, Set, TransactionTrait,
    prelude::*,
};
use std::collections::BTreeSet;
use tracing::{info, instrument};

/// One flavor group offered for a dish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlavorDraft {
    /// Group name (e.g., "Spiciness")
    pub name: String,
    /// Options, as the client encodes them
    pub value: String,
}

/// Editable fields of a dish.
#[derive(Debug, Clone, PartialEq)]
pub struct DishDraft {
    /// Display name, must not be blank
    pub name: String,
    /// Menu category
    pub category_id: i64,
    /// Unit price, non-negative
    pub price: f64,
    /// Image path or URL
    pub image: String,
    #[allow(missing_docs)]
    pub description: String,
    /// Replaces the dish's flavor rows entirely
    pub flavors: Vec<FlavorDraft>,
}

/// A dish together with its flavor rows.
#[derive(Debug, Clone, PartialEq)]
pub struct DishWithFlavors {
    #[allow(missing_docs)]
    pub dish: dish::Model,
    /// Flavor rows in insertion order
    pub flavors: Vec<dish_flavor::Model>,
}

/// Shared name/price validation for catalog listings.
pub(crate) fn validate_listing(name: &str, price: f64) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Name cannot be empty".to_string(),
        });
    }

    if price < 0.0 || !price.is_finite() {
        return Err(Error::Validation {
            message: format!("Invalid price: {price}"),
        });
    }

    Ok(())
}

async fn insert_flavors(
    txn: &DatabaseTransaction,
    dish_id: i64,
    flavors: &[FlavorDraft],
) -> Result<()> {
    if flavors.is_empty() {
        return Ok(());
    }

    let rows = flavors.iter().map(|f| dish_flavor::ActiveModel {
        dish_id: Set(dish_id),
        name: Set(f.name.clone()),
        value: Set(f.value.clone()),
        ..Default::default()
    });
    DishFlavor::insert_many(rows).exec(txn).await?;
    Ok(())
}

/// Creates a dish (off sale) and its flavors in one transaction.
#[instrument(skip(db, draft), fields(name = %draft.name))]
pub async fn create_dish(
    db: &DatabaseConnection,
    draft: DishDraft,
    actor_id: i64,
    now: DateTime<Utc>,
) -> Result<dish::Model> {
    validate_listing(&draft.name, draft.price)?;

    let now = now.naive_utc();
    let txn = db.begin().await?;

    let dish = dish::ActiveModel {
        name: Set(draft.name.trim().to_string()),
        category_id: Set(draft.category_id),
        price: Set(draft.price),
        image: Set(draft.image),
        description: Set(draft.description),
        status: Set(CatalogStatus::Disabled),
        create_time: Set(now),
        update_time: Set(now),
        create_user: Set(actor_id),
        update_user: Set(actor_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    insert_flavors(&txn, dish.id, &draft.flavors).await?;

    txn.commit().await?;
    info!(dish_id = dish.id, "Dish created");
    Ok(dish)
}

/// Retrieves a dish by its unique ID.
pub async fn get_dish_by_id<C>(db: &C, dish_id: i64) -> Result<Option<dish::Model>>
where
    C: ConnectionTrait,
{
    Dish::find_by_id(dish_id).one(db).await.map_err(Into::into)
}

/// Retrieves a dish and its flavors.
pub async fn get_dish_with_flavors(
    db: &DatabaseConnection,
    dish_id: i64,
) -> Result<DishWithFlavors> {
    let dish = get_dish_by_id(db, dish_id)
        .await?
        .ok_or(Error::DishNotFound { id: dish_id })?;

    let flavors = DishFlavor::find()
        .filter(dish_flavor::Column::DishId.eq(dish_id))
        .order_by_asc(dish_flavor::Column::Id)
        .all(db)
        .await?;

    Ok(DishWithFlavors { dish, flavors })
}

/// Updates a dish's listing and replaces its flavors. Sale status is left alone.
#[instrument(skip(db, draft))]
pub async fn update_dish(
    db: &DatabaseConnection,
    dish_id: i64,
    draft: DishDraft,
    actor_id: i64,
    now: DateTime<Utc>,
) -> Result<dish::Model> {
    validate_listing(&draft.name, draft.price)?;

    let txn = db.begin().await?;

    let mut dish: dish::ActiveModel = Dish::find_by_id(dish_id)
        .one(&txn)
        .await?
        .ok_or(Error::DishNotFound { id: dish_id })?
        .into();

    dish.name = Set(draft.name.trim().to_string());
    dish.category_id = Set(draft.category_id);
    dish.price = Set(draft.price);
    dish.image = Set(draft.image);
    dish.description = Set(draft.description);
    dish.update_time = Set(now.naive_utc());
    dish.update_user = Set(actor_id);
    let dish = dish.update(&txn).await?;

    DishFlavor::delete_many()
        .filter(dish_flavor::Column::DishId.eq(dish_id))
        .exec(&txn)
        .await?;
    insert_flavors(&txn, dish_id, &draft.flavors).await?;

    txn.commit().await?;
    Ok(dish)
}

/// Sets a dish on or off sale.
///
/// Unconditional. Disabling a dish does not touch combos that contain it; those
/// combos simply cannot be enabled again until the dish is.
#[instrument(skip(db))]
pub async fn set_dish_status(
    db: &DatabaseConnection,
    dish_id: i64,
    status: CatalogStatus,
    actor_id: i64,
    now: DateTime<Utc>,
) -> Result<dish::Model> {
    let mut dish: dish::ActiveModel = Dish::find_by_id(dish_id)
        .one(db)
        .await?
        .ok_or(Error::DishNotFound { id: dish_id })?
        .into();

    dish.status = Set(status);
    dish.update_time = Set(now.naive_utc());
    dish.update_user = Set(actor_id);
    dish.update(db).await.map_err(Into::into)
}

/// Deletes a batch of dishes and their flavors.
///
/// # Errors
/// - [`Error::DishNotFound`] if any id does not exist
/// - [`Error::DeletionBlocked`] with `OnSale` if any dish is enabled
/// - [`Error::DeletionBlocked`] with `ReferencedByCombo` if any dish is used by a
///   combo, whatever that combo's status
///
/// Nothing is deleted unless every dish in the batch passes both checks.
#[instrument(skip(db))]
pub async fn delete_dishes(db: &DatabaseConnection, ids: &[i64]) -> Result<u64> {
    let ids: BTreeSet<i64> = ids.iter().copied().collect();
    if ids.is_empty() {
        return Ok(0);
    }

    let txn = db.begin().await?;

    let dishes = Dish::find()
        .filter(dish::Column::Id.is_in(ids.iter().copied()))
        .all(&txn)
        .await?;

    if let Some(missing) = ids.iter().find(|id| !dishes.iter().any(|d| d.id == **id)) {
        return Err(Error::DishNotFound { id: *missing });
    }

    if dishes.iter().any(|d| d.status.is_enabled()) {
        return Err(Error::DeletionBlocked {
            reason: DeletionBlockedReason::OnSale,
        });
    }

    let references = ComboItem::find()
        .filter(combo_item::Column::DishId.is_in(ids.iter().copied()))
        .count(&txn)
        .await?;
    if references > 0 {
        return Err(Error::DeletionBlocked {
            reason: DeletionBlockedReason::ReferencedByCombo,
        });
    }

    DishFlavor::delete_many()
        .filter(dish_flavor::Column::DishId.is_in(ids.iter().copied()))
        .exec(&txn)
        .await?;
    let deleted = Dish::delete_many()
        .filter(dish::Column::Id.is_in(ids.iter().copied()))
        .exec(&txn)
        .await?
        .rows_affected;

    txn.commit().await?;
    info!(deleted, "Dishes deleted");
    Ok(deleted)
}

/// Lists the on-sale dishes of a category, alphabetically.
pub async fn list_enabled_dishes_by_category(
    db: &DatabaseConnection,
    category_id: i64,
) -> Result<Vec<dish::Model>> {
    Dish::find()
        .filter(dish::Column::CategoryId.eq(category_id))
        .filter(dish::Column::Status.eq(CatalogStatus::Enabled.to_value()))
        .order_by_asc(dish::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}
