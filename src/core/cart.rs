//! Cart business logic - Per-user shopping cart lines.
//!
//! A user has at most one line per product key. Adding an existing product bumps the
//! quantity; removing the last unit deletes the line. Quantity changes are done with
//! in-database arithmetic (`quantity = quantity +/- 1`) inside a transaction, so a
//! double-submitted request cannot lose an update. Name, image and price are copied
//! from the catalog when a line is first created and never refreshed afterwards.

use crate::{
    core::{combo::get_combo_by_id, dish::get_dish_by_id},
    entities::{CartLine, cart_line},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{debug, instrument};

/// The product a cart line is for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProductRef {
    /// A dish, optionally with a flavor selection
    Dish {
        /// Dish being ordered
        dish_id: i64,
        /// Chosen flavor text, `None` for a plain dish
        flavor: Option<String>,
    },
    /// A combo
    Combo {
        /// Combo being ordered
        combo_id: i64,
    },
}

impl ProductRef {
    /// A dish without a flavor selection.
    #[must_use]
    pub const fn dish(dish_id: i64) -> Self {
        Self::Dish {
            dish_id,
            flavor: None,
        }
    }

    /// A dish with the given flavor selection.
    #[must_use]
    pub fn dish_with_flavor(dish_id: i64, flavor: impl Into<String>) -> Self {
        Self::Dish {
            dish_id,
            flavor: Some(flavor.into()),
        }
    }

    #[must_use]
    #[allow(missing_docs)]
    pub const fn combo(combo_id: i64) -> Self {
        Self::Combo { combo_id }
    }

    /// Condition selecting the line for this product in `user_id`'s cart.
    ///
    /// A dish without a flavor and the same dish with a flavor are different lines.
    fn line_condition(&self, user_id: i64) -> Condition {
        let condition = Condition::all().add(cart_line::Column::UserId.eq(user_id));
        match self {
            Self::Dish { dish_id, flavor } => {
                let condition = condition.add(cart_line::Column::DishId.eq(*dish_id));
                match flavor {
                    Some(flavor) => condition.add(cart_line::Column::DishFlavor.eq(flavor.as_str())),
                    None => condition.add(cart_line::Column::DishFlavor.is_null()),
                }
            }
            Self::Combo { combo_id } => condition.add(cart_line::Column::ComboId.eq(*combo_id)),
        }
    }
}

async fn find_line<C>(db: &C, user_id: i64, product: &ProductRef) -> Result<Option<cart_line::Model>>
where
    C: ConnectionTrait,
{
    CartLine::find()
        .filter(product.line_condition(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn adjust_quantity<C>(db: &C, line_id: i64, delta: i32) -> Result<cart_line::Model>
where
    C: ConnectionTrait,
{
    CartLine::update_many()
        .col_expr(
            cart_line::Column::Quantity,
            Expr::col(cart_line::Column::Quantity).add(delta),
        )
        .filter(cart_line::Column::Id.eq(line_id))
        .exec(db)
        .await?;

    CartLine::find_by_id(line_id)
        .one(db)
        .await?
        .ok_or_else(|| {
            Error::Database(DbErr::RecordNotFound(format!("cart line {line_id}")))
        })
}

/// Adds one unit of `product` to the user's cart.
///
/// # Errors
/// - [`Error::DishNotFound`] / [`Error::ComboNotFound`] when a new line would reference
///   a product that does not exist
#[instrument(skip(db))]
pub async fn add_line(
    db: &DatabaseConnection,
    user_id: i64,
    product: &ProductRef,
    now: DateTime<Utc>,
) -> Result<cart_line::Model> {
    let txn = db.begin().await?;

    if let Some(line) = find_line(&txn, user_id, product).await? {
        let line = adjust_quantity(&txn, line.id, 1).await?;
        txn.commit().await?;
        debug!(line_id = line.id, quantity = line.quantity, "Cart line incremented");
        return Ok(line);
    }

    let mut line = cart_line::ActiveModel {
        user_id: Set(user_id),
        quantity: Set(1),
        create_time: Set(now),
        ..Default::default()
    };

    match product {
        ProductRef::Dish { dish_id, flavor } => {
            let dish = get_dish_by_id(&txn, *dish_id)
                .await?
                .ok_or(Error::DishNotFound { id: *dish_id })?;
            line.dish_id = Set(Some(dish.id));
            line.dish_flavor = Set(flavor.clone());
            line.combo_id = Set(None);
            line.name = Set(dish.name);
            line.image = Set(dish.image);
            line.unit_price = Set(dish.price);
        }
        ProductRef::Combo { combo_id } => {
            let combo = get_combo_by_id(&txn, *combo_id)
                .await?
                .ok_or(Error::ComboNotFound { id: *combo_id })?;
            line.dish_id = Set(None);
            line.dish_flavor = Set(None);
            line.combo_id = Set(Some(combo.id));
            line.name = Set(combo.name);
            line.image = Set(combo.image);
            line.unit_price = Set(combo.price);
        }
    }

    let line = line.insert(&txn).await?;
    txn.commit().await?;
    debug!(line_id = line.id, "Cart line created");
    Ok(line)
}

/// Removes one unit of `product` from the user's cart.
///
/// Returns the remaining line, or `None` when the line was deleted or never existed.
#[instrument(skip(db))]
pub async fn remove_one_line(
    db: &DatabaseConnection,
    user_id: i64,
    product: &ProductRef,
) -> Result<Option<cart_line::Model>> {
    let txn = db.begin().await?;

    let Some(line) = find_line(&txn, user_id, product).await? else {
        return Ok(None);
    };

    let remaining = if line.quantity <= 1 {
        CartLine::delete_by_id(line.id).exec(&txn).await?;
        None
    } else {
        Some(adjust_quantity(&txn, line.id, -1).await?)
    };

    txn.commit().await?;
    Ok(remaining)
}

/// Deletes every line in the user's cart, returning how many were removed.
pub async fn clear_cart(db: &DatabaseConnection, user_id: i64) -> Result<u64> {
    let result = CartLine::delete_many()
        .filter(cart_line::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Lists the user's cart lines in the order they were first added.
pub async fn list_cart(db: &DatabaseConnection, user_id: i64) -> Result<Vec<cart_line::Model>> {
    CartLine::find()
        .filter(cart_line::Column::UserId.eq(user_id))
        .order_by_asc(cart_line::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
