//! Order business logic - Persists lifecycle transitions.
//!
//! Every status change goes through [`apply_transition`] and is written back with a
//! single conditional `UPDATE ... WHERE id = ? AND status = <expected>`. If another
//! writer moved the order first, the update matches no row and the caller gets
//! [`Error::OrderStateConflict`] instead of silently overwriting the newer state.

use crate::{
    core::order_state::apply_transition,
    entities::{Order, OrderStatus, order},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveEnum, QueryOrder, Set, prelude::*};
use tracing::{debug, instrument};

/// Inserts a new order in `PendingPayment`, as the checkout flow does.
pub async fn create_order(
    db: &DatabaseConnection,
    user_id: i64,
    number: String,
    amount: f64,
    order_time: DateTime<Utc>,
) -> Result<order::Model> {
    if number.trim().is_empty() {
        return Err(Error::Validation {
            message: "Order number cannot be empty".to_string(),
        });
    }

    if amount < 0.0 || !amount.is_finite() {
        return Err(Error::Validation {
            message: format!("Invalid order amount: {amount}"),
        });
    }

    let order = order::ActiveModel {
        number: Set(number.trim().to_string()),
        user_id: Set(user_id),
        status: Set(OrderStatus::PendingPayment),
        amount: Set(amount),
        order_time: Set(order_time),
        checkout_time: Set(None),
        cancel_reason: Set(None),
        cancel_time: Set(None),
        rejection_reason: Set(None),
        delivery_time: Set(None),
        ..Default::default()
    };
    order.insert(db).await.map_err(Into::into)
}

/// Retrieves an order by its unique ID.
pub async fn get_order_by_id<C>(db: &C, order_id: i64) -> Result<Option<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds all orders in `status` whose `order_time` is at or before `order_time_before`,
/// oldest first.
pub async fn find_orders<C>(
    db: &C,
    status: OrderStatus,
    order_time_before: DateTime<Utc>,
) -> Result<Vec<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .filter(order::Column::Status.eq(status.to_value()))
        .filter(order::Column::OrderTime.lte(order_time_before))
        .order_by_asc(order::Column::OrderTime)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Writes `next` over `current` if the stored status still equals `current.status`.
///
/// Only lifecycle columns are written; `order_time` and the order's identity are never
/// touched.
pub async fn save_transition<C>(db: &C, current: &order::Model, next: &order::Model) -> Result<()>
where
    C: ConnectionTrait,
{
    let changes = order::ActiveModel {
        status: Set(next.status),
        checkout_time: Set(next.checkout_time),
        cancel_reason: Set(next.cancel_reason.clone()),
        cancel_time: Set(next.cancel_time),
        rejection_reason: Set(next.rejection_reason.clone()),
        delivery_time: Set(next.delivery_time),
        ..Default::default()
    };

    let result = Order::update_many()
        .set(changes)
        .filter(order::Column::Id.eq(current.id))
        .filter(order::Column::Status.eq(current.status.to_value()))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::OrderStateConflict {
            order_id: current.id,
            expected: current.status,
        });
    }

    debug!(
        order_id = current.id,
        from = ?current.status,
        to = ?next.status,
        "Order transitioned"
    );
    Ok(())
}

/// Reads the current row, applies the transition and persists it conditionally.
///
/// `rejection_reason` is stored alongside the cancel fields when the merchant
/// refuses an order.
#[instrument(skip(db))]
async fn transition<C>(
    db: &C,
    order_id: i64,
    target: OrderStatus,
    reason: Option<&str>,
    rejection_reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    let current = get_order_by_id(db, order_id)
        .await?
        .ok_or(Error::OrderNotFound { id: order_id })?;

    let mut next = apply_transition(&current, target, reason, now)?;
    if let Some(rejection) = rejection_reason {
        next.rejection_reason = Some(rejection.to_string());
    }

    save_transition(db, &current, &next).await?;
    Ok(next)
}

/// Moves a paid order to `ToBeConfirmed` and stamps `checkout_time`.
pub async fn confirm_payment(
    db: &DatabaseConnection,
    order_id: i64,
    now: DateTime<Utc>,
) -> Result<order::Model> {
    transition(db, order_id, OrderStatus::ToBeConfirmed, None, None, now).await
}

/// Merchant accepts the order.
pub async fn accept_order(
    db: &DatabaseConnection,
    order_id: i64,
    now: DateTime<Utc>,
) -> Result<order::Model> {
    transition(db, order_id, OrderStatus::Confirmed, None, None, now).await
}

/// Merchant refuses the order; the rejection reason doubles as the cancel reason.
pub async fn reject_order(
    db: &DatabaseConnection,
    order_id: i64,
    rejection_reason: &str,
    now: DateTime<Utc>,
) -> Result<order::Model> {
    transition(
        db,
        order_id,
        OrderStatus::Cancelled,
        Some(rejection_reason),
        Some(rejection_reason),
        now,
    )
    .await
}

/// Cancels an order that has not been accepted yet.
pub async fn cancel_order(
    db: &DatabaseConnection,
    order_id: i64,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<order::Model> {
    transition(db, order_id, OrderStatus::Cancelled, Some(reason), None, now).await
}

/// Hands an accepted order to delivery.
pub async fn dispatch_order(
    db: &DatabaseConnection,
    order_id: i64,
    now: DateTime<Utc>,
) -> Result<order::Model> {
    transition(db, order_id, OrderStatus::DeliveryInProgress, None, None, now).await
}

/// Marks a delivered order as completed and stamps `delivery_time`.
pub async fn complete_order(
    db: &DatabaseConnection,
    order_id: i64,
    now: DateTime<Utc>,
) -> Result<order::Model> {
    transition(db, order_id, OrderStatus::Completed, None, None, now).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_order_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_order(&db, 1, "  ".to_string(), 10.0, Utc::now()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_order(&db, 1, "A-1".to_string(), -1.0, Utc::now()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        let result = create_order(&db, 1, "A-1".to_string(), f64::NAN, Utc::now()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_starts_pending() -> Result<()> {
        let db = setup_test_db().await?;
        let placed = fixed_now();

        let order = create_order(&db, 3, "A-1".to_string(), 58.5, placed).await?;

        assert_eq!(order.status, OrderStatus::PendingPayment);
        assert_eq!(order.order_time, placed);
        assert!(order.cancel_reason.is_none());
        assert!(order.cancel_time.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_happy_path_lifecycle() -> Result<()> {
        let db = setup_test_db().await?;
        let now = fixed_now();
        let order = create_order(&db, 3, "A-1".to_string(), 58.5, now).await?;

        confirm_payment(&db, order.id, now).await?;
        accept_order(&db, order.id, now).await?;
        dispatch_order(&db, order.id, now).await?;
        let done = complete_order(&db, order.id, now + Duration::minutes(40)).await?;

        assert_eq!(done.status, OrderStatus::Completed);
        let stored = get_order_by_id(&db, order.id).await?.unwrap();
        assert_eq!(stored, done);
        assert_eq!(stored.checkout_time, Some(now));
        assert_eq!(stored.delivery_time, Some(now + Duration::minutes(40)));
        assert_eq!(stored.order_time, now);

        Ok(())
    }

    #[tokio::test]
    async fn test_reject_order_records_both_reasons() -> Result<()> {
        let db = setup_test_db().await?;
        let now = fixed_now();
        let order = create_order(&db, 3, "A-1".to_string(), 20.0, now).await?;
        confirm_payment(&db, order.id, now).await?;

        let rejected = reject_order(&db, order.id, "kitchen closed", now).await?;

        assert_eq!(rejected.status, OrderStatus::Cancelled);
        assert_eq!(rejected.cancel_reason.as_deref(), Some("kitchen closed"));
        assert_eq!(rejected.rejection_reason.as_deref(), Some("kitchen closed"));
        assert_eq!(rejected.cancel_time, Some(now));

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_transition_is_not_persisted() -> Result<()> {
        let db = setup_test_db().await?;
        let now = fixed_now();
        let order = insert_order(&db, OrderStatus::Confirmed, now).await?;

        let result = cancel_order(&db, order.id, "too late", now).await;

        assert!(matches!(
            result,
            Err(Error::InvalidTransition {
                from: OrderStatus::Confirmed,
                to: OrderStatus::Cancelled,
            })
        ));
        let stored = get_order_by_id(&db, order.id).await?.unwrap();
        assert_eq!(stored, order);

        Ok(())
    }

    #[tokio::test]
    async fn test_stale_copy_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let now = fixed_now();
        let stale = insert_order(&db, OrderStatus::PendingPayment, now).await?;

        // Someone else pays for the order after we read it
        confirm_payment(&db, stale.id, now).await?;

        let next = apply_transition(&stale, OrderStatus::Cancelled, Some("timeout"), now)?;
        let result = save_transition(&db, &stale, &next).await;

        assert!(matches!(
            result,
            Err(Error::OrderStateConflict {
                expected: OrderStatus::PendingPayment,
                ..
            })
        ));
        let stored = get_order_by_id(&db, stale.id).await?.unwrap();
        assert_eq!(stored.status, OrderStatus::ToBeConfirmed);
        assert!(stored.cancel_reason.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_transition_unknown_order() -> Result<()> {
        let db = setup_test_db().await?;

        let result = accept_order(&db, 999, fixed_now()).await;

        assert!(matches!(result, Err(Error::OrderNotFound { id: 999 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_find_orders_filters_status_and_time() -> Result<()> {
        let db = setup_test_db().await?;
        let now = fixed_now();
        let old = insert_order(&db, OrderStatus::PendingPayment, now - Duration::minutes(20)).await?;
        let _fresh = insert_order(&db, OrderStatus::PendingPayment, now).await?;
        let _other = insert_order(&db, OrderStatus::Confirmed, now - Duration::minutes(20)).await?;

        let found = find_orders(&db, OrderStatus::PendingPayment, now - Duration::minutes(15)).await?;

        assert_eq!(found, vec![old]);
        Ok(())
    }
}
