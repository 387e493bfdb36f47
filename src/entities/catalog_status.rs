//! Sale status shared by dishes and combos.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a catalog item is currently on sale.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
pub enum CatalogStatus {
    /// Off sale; may be deleted
    #[sea_orm(num_value = 0)]
    Disabled,
    /// On sale
    #[sea_orm(num_value = 1)]
    Enabled,
}

impl CatalogStatus {
    /// Whether the item can currently be ordered.
    #[must_use]
    pub const fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}
