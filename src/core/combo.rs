//! Combo business logic - Meal bundles and the combo side of the integrity guard.
//!
//! A combo is created off sale with its items. It can be put on sale only while
//! every dish it contains is on sale, and can be deleted only while off sale.
//! Item names and prices are copied from the dishes when the combo is written.

use crate::{
    core::dish::validate_listing,
    entities::{CatalogStatus, Combo, ComboItem, Dish, combo, combo_item, dish},
    errors::{DeletionBlockedReason, EnableBlockedReason, Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveEnum, DatabaseTransaction, PaginatorTrait, QueryOrder, Set, TransactionTrait,
    prelude::*,
};
use std::collections::BTreeSet;
use tracing::{info, instrument, warn};

/// One dish inside a combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboItemDraft {
    /// Dish to include; must exist
    pub dish_id: i64,
    /// How many of the dish the combo contains; at least 1
    pub copies: i32,
}

/// Editable fields of a combo.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboDraft {
    /// Menu category
    pub category_id: i64,
    /// Display name, must not be blank
    pub name: String,
    /// Bundle price, non-negative
    pub price: f64,
    #[allow(missing_docs)]
    pub description: String,
    /// Image path or URL
    pub image: String,
    /// Replaces the combo's items entirely
    pub items: Vec<ComboItemDraft>,
}

/// A combo together with its items, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboWithItems {
    #[allow(missing_docs)]
    pub combo: combo::Model,
    #[allow(missing_docs)]
    pub items: Vec<combo_item::Model>,
}

fn validate_draft(draft: &ComboDraft) -> Result<()> {
    validate_listing(&draft.name, draft.price)?;

    if draft.items.is_empty() {
        return Err(Error::Validation {
            message: "A combo needs at least one dish".to_string(),
        });
    }

    if let Some(item) = draft.items.iter().find(|i| i.copies < 1) {
        return Err(Error::Validation {
            message: format!("Invalid copies {} for dish {}", item.copies, item.dish_id),
        });
    }

    Ok(())
}

async fn insert_items(
    txn: &DatabaseTransaction,
    combo_id: i64,
    items: &[ComboItemDraft],
) -> Result<()> {
    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let dish = Dish::find_by_id(item.dish_id)
            .one(txn)
            .await?
            .ok_or(Error::DishNotFound { id: item.dish_id })?;

        rows.push(combo_item::ActiveModel {
            combo_id: Set(combo_id),
            dish_id: Set(dish.id),
            name: Set(dish.name),
            price: Set(dish.price),
            copies: Set(item.copies),
            ..Default::default()
        });
    }

    ComboItem::insert_many(rows).exec(txn).await?;
    Ok(())
}

/// Creates a combo (off sale) and its items in one transaction.
#[instrument(skip(db, draft), fields(name = %draft.name))]
pub async fn create_combo(
    db: &DatabaseConnection,
    draft: ComboDraft,
    actor_id: i64,
    now: DateTime<Utc>,
) -> Result<combo::Model> {
    validate_draft(&draft)?;

    let now = now.naive_utc();
    let txn = db.begin().await?;

    let combo = combo::ActiveModel {
        category_id: Set(draft.category_id),
        name: Set(draft.name.trim().to_string()),
        price: Set(draft.price),
        status: Set(CatalogStatus::Disabled),
        description: Set(draft.description),
        image: Set(draft.image),
        create_time: Set(now),
        update_time: Set(now),
        create_user: Set(actor_id),
        update_user: Set(actor_id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    insert_items(&txn, combo.id, &draft.items).await?;

    txn.commit().await?;
    info!(combo_id = combo.id, "Combo created");
    Ok(combo)
}

/// Retrieves a combo by its unique ID.
pub async fn get_combo_by_id<C>(db: &C, combo_id: i64) -> Result<Option<combo::Model>>
where
    C: ConnectionTrait,
{
    Combo::find_by_id(combo_id).one(db).await.map_err(Into::into)
}

async fn get_items<C>(db: &C, combo_id: i64) -> Result<Vec<combo_item::Model>>
where
    C: ConnectionTrait,
{
    ComboItem::find()
        .filter(combo_item::Column::ComboId.eq(combo_id))
        .order_by_asc(combo_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a combo and its items.
pub async fn get_combo_with_items(
    db: &DatabaseConnection,
    combo_id: i64,
) -> Result<ComboWithItems> {
    let combo = get_combo_by_id(db, combo_id)
        .await?
        .ok_or(Error::ComboNotFound { id: combo_id })?;
    let items = get_items(db, combo_id).await?;

    Ok(ComboWithItems { combo, items })
}

/// Updates a combo's listing and replaces its items. Sale status is left alone.
#[instrument(skip(db, draft))]
pub async fn update_combo(
    db: &DatabaseConnection,
    combo_id: i64,
    draft: ComboDraft,
    actor_id: i64,
    now: DateTime<Utc>,
) -> Result<combo::Model> {
    validate_draft(&draft)?;

    let txn = db.begin().await?;

    let mut combo: combo::ActiveModel = Combo::find_by_id(combo_id)
        .one(&txn)
        .await?
        .ok_or(Error::ComboNotFound { id: combo_id })?
        .into();

    combo.category_id = Set(draft.category_id);
    combo.name = Set(draft.name.trim().to_string());
    combo.price = Set(draft.price);
    combo.description = Set(draft.description);
    combo.image = Set(draft.image);
    combo.update_time = Set(now.naive_utc());
    combo.update_user = Set(actor_id);
    let combo = combo.update(&txn).await?;

    ComboItem::delete_many()
        .filter(combo_item::Column::ComboId.eq(combo_id))
        .exec(&txn)
        .await?;
    insert_items(&txn, combo_id, &draft.items).await?;

    txn.commit().await?;
    Ok(combo)
}

/// Puts a combo on or off sale.
///
/// # Errors
/// - [`Error::ComboNotFound`] if the combo does not exist
/// - [`Error::EnableBlocked`] when enabling a combo that contains a disabled dish
///
/// Disabling has no precondition.
#[instrument(skip(db))]
pub async fn set_combo_status(
    db: &DatabaseConnection,
    combo_id: i64,
    status: CatalogStatus,
    actor_id: i64,
    now: DateTime<Utc>,
) -> Result<combo::Model> {
    let txn = db.begin().await?;

    let mut combo: combo::ActiveModel = Combo::find_by_id(combo_id)
        .one(&txn)
        .await?
        .ok_or(Error::ComboNotFound { id: combo_id })?
        .into();

    if status.is_enabled() {
        let dish_ids: BTreeSet<i64> = get_items(&txn, combo_id)
            .await?
            .into_iter()
            .map(|item| item.dish_id)
            .collect();

        let disabled = Dish::find()
            .filter(dish::Column::Id.is_in(dish_ids))
            .filter(dish::Column::Status.eq(CatalogStatus::Disabled.to_value()))
            .count(&txn)
            .await?;
        if disabled > 0 {
            warn!(combo_id, disabled, "Combo contains disabled dishes");
            return Err(Error::EnableBlocked {
                reason: EnableBlockedReason::ContainsDisabledDish,
            });
        }
    }

    combo.status = Set(status);
    combo.update_time = Set(now.naive_utc());
    combo.update_user = Set(actor_id);
    let combo = combo.update(&txn).await?;

    txn.commit().await?;
    Ok(combo)
}

/// Deletes a batch of combos and their items.
///
/// # Errors
/// - [`Error::ComboNotFound`] if any id does not exist
/// - [`Error::DeletionBlocked`] with `OnSale` if any combo is enabled
///
/// Nothing is deleted unless the whole batch passes.
#[instrument(skip(db))]
pub async fn delete_combos(db: &DatabaseConnection, ids: &[i64]) -> Result<u64> {
    let ids: BTreeSet<i64> = ids.iter().copied().collect();
    if ids.is_empty() {
        return Ok(0);
    }

    let txn = db.begin().await?;

    let combos = Combo::find()
        .filter(combo::Column::Id.is_in(ids.iter().copied()))
        .all(&txn)
        .await?;

    if let Some(missing) = ids.iter().find(|id| !combos.iter().any(|c| c.id == **id)) {
        return Err(Error::ComboNotFound { id: *missing });
    }

    if combos.iter().any(|c| c.status.is_enabled()) {
        return Err(Error::DeletionBlocked {
            reason: DeletionBlockedReason::OnSale,
        });
    }

    ComboItem::delete_many()
        .filter(combo_item::Column::ComboId.is_in(ids.iter().copied()))
        .exec(&txn)
        .await?;
    let deleted = Combo::delete_many()
        .filter(combo::Column::Id.is_in(ids.iter().copied()))
        .exec(&txn)
        .await?
        .rows_affected;

    txn.commit().await?;
    info!(deleted, "Combos deleted");
    Ok(deleted)
}

/// Lists the on-sale combos of a category, alphabetically.
pub async fn list_enabled_combos_by_category(
    db: &DatabaseConnection,
    category_id: i64,
) -> Result<Vec<combo::Model>> {
    Combo::find()
        .filter(combo::Column::CategoryId.eq(category_id))
        .filter(combo::Column::Status.eq(CatalogStatus::Enabled.to_value()))
        .order_by_asc(combo::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::dish::{get_dish_by_id, set_dish_status};
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn combo_draft(name: &str, dish_ids: &[i64]) -> ComboDraft {
        ComboDraft {
            category_id: TEST_CATEGORY_ID,
            name: name.to_string(),
            price: 30.0,
            description: String::new(),
            image: "combo.png".to_string(),
            items: dish_ids
                .iter()
                .map(|&dish_id| ComboItemDraft { dish_id, copies: 1 })
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_create_combo_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_combo(&db, combo_draft("Empty", &[]), ADMIN_ID, fixed_now()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let mut draft = combo_draft("Zero copies", &[1]);
        draft.items[0].copies = 0;
        let result = create_combo(&db, draft, ADMIN_ID, fixed_now()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_combo(&db, combo_draft("", &[1]), ADMIN_ID, fixed_now()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_combo_snapshots_dish_details() -> Result<()> {
        let db = setup_test_db().await?;
        let rice = create_test_dish(&db, "Rice", CatalogStatus::Enabled).await?;
        let soup = create_test_dish(&db, "Soup", CatalogStatus::Enabled).await?;
        let mut draft = combo_draft("Lunch Set", &[rice.id, soup.id]);
        draft.items[1].copies = 2;

        let combo = create_combo(&db, draft, ADMIN_ID, fixed_now()).await?;
        let details = get_combo_with_items(&db, combo.id).await?;

        assert_eq!(details.combo.status, CatalogStatus::Disabled);
        assert_eq!(details.items.len(), 2);
        assert_eq!(details.items[0].name, "Rice");
        assert_eq!(details.items[0].price, rice.price);
        assert_eq!(details.items[1].dish_id, soup.id);
        assert_eq!(details.items[1].copies, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_combo_with_unknown_dish_writes_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let rice = create_test_dish(&db, "Rice", CatalogStatus::Enabled).await?;

        let result = create_combo(&db, combo_draft("Ghost Set", &[rice.id, 777]), ADMIN_ID, fixed_now())
            .await;

        assert!(matches!(result, Err(Error::DishNotFound { id: 777 })));
        assert_eq!(Combo::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_combo_replaces_items() -> Result<()> {
        let db = setup_test_db().await?;
        let rice = create_test_dish(&db, "Rice", CatalogStatus::Enabled).await?;
        let noodles = create_test_dish(&db, "Noodles", CatalogStatus::Enabled).await?;
        let combo = create_combo(&db, combo_draft("Set", &[rice.id]), ADMIN_ID, fixed_now()).await?;

        let mut draft = combo_draft("Noodle Set", &[noodles.id]);
        draft.price = 25.0;
        let updated = update_combo(&db, combo.id, draft, 8, fixed_now()).await?;
        let details = get_combo_with_items(&db, combo.id).await?;

        assert_eq!(updated.name, "Noodle Set");
        assert_eq!(updated.price, 25.0);
        assert_eq!(updated.update_user, 8);
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].dish_id, noodles.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_enable_blocked_by_disabled_dish() -> Result<()> {
        let db = setup_test_db().await?;
        let on = create_test_dish(&db, "Rice", CatalogStatus::Enabled).await?;
        let off = create_test_dish(&db, "Seasonal Greens", CatalogStatus::Disabled).await?;
        let combo = create_test_combo(&db, "Set", &[on.id, off.id], CatalogStatus::Disabled).await?;

        let result = set_combo_status(&db, combo.id, CatalogStatus::Enabled, ADMIN_ID, fixed_now()).await;
        assert!(matches!(
            result,
            Err(Error::EnableBlocked {
                reason: EnableBlockedReason::ContainsDisabledDish
            })
        ));
        let unchanged = get_combo_by_id(&db, combo.id).await?.unwrap();
        assert_eq!(unchanged.status, CatalogStatus::Disabled);

        set_dish_status(&db, off.id, CatalogStatus::Enabled, ADMIN_ID, fixed_now()).await?;
        let enabled =
            set_combo_status(&db, combo.id, CatalogStatus::Enabled, ADMIN_ID, fixed_now()).await?;
        assert_eq!(enabled.status, CatalogStatus::Enabled);

        Ok(())
    }

    #[tokio::test]
    async fn test_disable_has_no_precondition() -> Result<()> {
        let db = setup_test_db().await?;
        let off = create_test_dish(&db, "Greens", CatalogStatus::Disabled).await?;
        let combo = create_test_combo(&db, "Set", &[off.id], CatalogStatus::Enabled).await?;

        let disabled =
            set_combo_status(&db, combo.id, CatalogStatus::Disabled, ADMIN_ID, fixed_now()).await?;

        assert_eq!(disabled.status, CatalogStatus::Disabled);
        Ok(())
    }

    #[tokio::test]
    async fn test_set_status_unknown_combo() -> Result<()> {
        let db = setup_test_db().await?;

        let result = set_combo_status(&db, 31, CatalogStatus::Disabled, ADMIN_ID, fixed_now()).await;

        assert!(matches!(result, Err(Error::ComboNotFound { id: 31 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_enabled_combo_is_blocked() -> Result<()> {
        let db = setup_test_db().await?;
        let dish = create_test_dish(&db, "Rice", CatalogStatus::Enabled).await?;
        let off = create_test_combo(&db, "Off", &[dish.id], CatalogStatus::Disabled).await?;
        let on = create_test_combo(&db, "On", &[dish.id], CatalogStatus::Enabled).await?;

        let result = delete_combos(&db, &[off.id, on.id]).await;

        assert!(matches!(
            result,
            Err(Error::DeletionBlocked {
                reason: DeletionBlockedReason::OnSale
            })
        ));
        assert!(get_combo_by_id(&db, off.id).await?.is_some());
        assert!(get_combo_by_id(&db, on.id).await?.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_combo_removes_items_and_frees_dishes() -> Result<()> {
        let db = setup_test_db().await?;
        let dish = create_test_dish(&db, "Rice", CatalogStatus::Disabled).await?;
        let combo = create_test_combo(&db, "Set", &[dish.id], CatalogStatus::Disabled).await?;

        let deleted = delete_combos(&db, &[combo.id]).await?;

        assert_eq!(deleted, 1);
        assert!(get_combo_by_id(&db, combo.id).await?.is_none());
        let items = ComboItem::find()
            .filter(combo_item::Column::ComboId.eq(combo.id))
            .count(&db)
            .await?;
        assert_eq!(items, 0);

        // With the combo gone the dish is no longer referenced
        crate::core::dish::delete_dishes(&db, &[dish.id]).await?;
        assert!(get_dish_by_id(&db, dish.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_enabled_combos_by_category() -> Result<()> {
        let db = setup_test_db().await?;
        let dish = create_test_dish(&db, "Rice", CatalogStatus::Enabled).await?;
        let on = create_test_combo(&db, "On", &[dish.id], CatalogStatus::Enabled).await?;
        create_test_combo(&db, "Off", &[dish.id], CatalogStatus::Disabled).await?;

        let listed = list_enabled_combos_by_category(&db, TEST_CATEGORY_ID).await?;

        assert_eq!(listed, vec![on]);
        Ok(())
    }
}
