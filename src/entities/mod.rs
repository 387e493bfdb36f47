//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod cart_line;
pub mod catalog_status;
pub mod combo;
pub mod combo_item;
pub mod dish;
pub mod dish_flavor;
pub mod order;

pub use catalog_status::CatalogStatus;
pub use order::OrderStatus;

// Re-export specific types to avoid conflicts
pub use cart_line::{Column as CartLineColumn, Entity as CartLine, Model as CartLineModel};
pub use combo::{Column as ComboColumn, Entity as Combo, Model as ComboModel};
pub use combo_item::{Column as ComboItemColumn, Entity as ComboItem, Model as ComboItemModel};
pub use dish::{Column as DishColumn, Entity as Dish, Model as DishModel};
pub use dish_flavor::{
    Column as DishFlavorColumn, Entity as DishFlavor, Model as DishFlavorModel,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
