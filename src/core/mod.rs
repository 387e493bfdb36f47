/// Per-user shopping cart lines
pub mod cart;
/// Combo catalog management and enable/delete guards
pub mod combo;
/// Dish catalog management and delete guard
pub mod dish;
/// Order lifecycle persistence and actions
pub mod order;
/// Order state machine
pub mod order_state;
/// Timeout and stuck-delivery sweeps
pub mod reconcile;
