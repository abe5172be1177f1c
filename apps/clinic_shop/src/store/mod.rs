// clinic_shop/src/store/mod.rs

//! Storage seam for the shop.
//!
//! Everything that touches persisted state goes through [`ShopStore`], handed
//! to handlers and pipelines as an `Arc<dyn ShopStore>`. Two implementations
//! ship with the crate: [`PgStore`] over sqlx/Postgres and [`MemoryStore`]
//! for tests and database-free runs.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{CartItem, CartLine, NewOrder, NewOrderItem, Order, OrderItem, Product};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// The guarded stock decrement matched no row: the product no longer has
  /// the requested quantity available.
  #[error("stock for product {product_id} changed during checkout")]
  StockConflict { product_id: Uuid },

  #[error("storage backend error: {0}")]
  Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CatalogStore: Send + Sync {
  async fn list_products(&self) -> StoreResult<Vec<Product>>;
  async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>>;
}

#[async_trait]
pub trait CartStore: Send + Sync {
  /// The user's cart joined with current product price and stock, oldest first.
  async fn list_cart(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>>;

  async fn get_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<Option<CartItem>>;

  /// Inserts a line, or adds `quantity` to the user's existing line for the product.
  async fn upsert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> StoreResult<CartItem>;

  /// Returns `None` when the item does not exist or belongs to another user.
  async fn set_cart_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> StoreResult<Option<CartItem>>;

  /// Returns whether a line was removed.
  async fn remove_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait OrderLedger: Send + Sync {
  /// Newest first.
  async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<Order>>;

  async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> StoreResult<Option<(Order, Vec<OrderItem>)>>;
}

#[async_trait]
pub trait ShopStore: CatalogStore + CartStore + OrderLedger {
  /// Opens the unit of work used by checkout.
  async fn begin(&self) -> StoreResult<Box<dyn CheckoutTx>>;
}

/// The writes of one checkout. Nothing is visible to other readers until
/// `commit`; dropping the value without committing discards every write.
#[async_trait]
pub trait CheckoutTx: Send {
  async fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order>;

  async fn insert_order_item(&mut self, item: &NewOrderItem) -> StoreResult<OrderItem>;

  /// Single guarded decrement (`stock = stock - n` where `stock >= n`).
  /// Fails with `StockConflict` when the guard does not hold.
  async fn decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> StoreResult<()>;

  /// Deletes every cart line of the user, returning how many were removed.
  async fn clear_cart(&mut self, user_id: Uuid) -> StoreResult<u64>;

  async fn commit(self: Box<Self>) -> StoreResult<()>;

  async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
