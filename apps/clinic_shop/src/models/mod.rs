// clinic_shop/src/models/mod.rs

//! Rows of the shop schema and the values built from them.

pub mod cart_item;
pub mod order;
pub mod order_item;
pub mod product;

pub use cart_item::{CartItem, CartLine};
pub use order::{NewOrder, Order, OrderStatus, OrderSummary};
pub use order_item::{NewOrderItem, OrderItem};
pub use product::Product;

/// Renders integer cents as a currency amount for JSON responses.
pub fn cents_to_amount(cents: i64) -> f64 {
  cents as f64 / 100.0
}
