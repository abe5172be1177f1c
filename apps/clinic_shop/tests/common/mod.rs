// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use clinic_flow::FlowRegistry;
use clinic_shop::errors::AppError;
use clinic_shop::models::{CartItem, CartLine, NewOrder, NewOrderItem, Order, OrderItem, Product};
use clinic_shop::pipelines::register_all_pipelines;
use clinic_shop::store::{
  CartStore, CatalogStore, CheckoutTx, MemoryStore, OrderLedger, ShopStore, StoreError, StoreResult,
};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Barrier;
use tracing::Level;
use uuid::Uuid;

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn registry() -> FlowRegistry<AppError> {
  let flows = FlowRegistry::<AppError>::new();
  register_all_pipelines(&flows).unwrap();
  flows
}

/// Puts `quantity` of `product_id` in the user's cart without the add-to-cart
/// stock check, so tests can build carts that exceed stock.
pub async fn put_in_cart(store: &MemoryStore, user_id: Uuid, product_id: Uuid, quantity: i32) -> CartItem {
  store.upsert_cart_item(user_id, product_id, quantity).await.unwrap()
}

/// `MemoryStore` with knobs for the failure and race scenarios checkout must survive.
#[derive(Clone, Default)]
pub struct HookedStore {
  pub inner: MemoryStore,
  /// Fail the n-th (1-based) `insert_order_item` of a transaction.
  pub fail_order_item_at: Option<usize>,
  /// Change a product's price right before the transaction opens.
  pub reprice_on_begin: Option<(Uuid, i64)>,
  /// Hold every `begin` until the barrier fills, so concurrent checkouts
  /// have all loaded and checked their carts before any transaction opens.
  pub begin_barrier: Option<Arc<Barrier>>,
  pub begin_calls: Arc<AtomicUsize>,
}

impl HookedStore {
  pub fn new(inner: MemoryStore) -> Self {
    Self {
      inner,
      ..Self::default()
    }
  }

  /// A store whose transactions only open once `parties` checkouts reach `begin`.
  pub fn gated(inner: MemoryStore, parties: usize) -> Self {
    Self {
      begin_barrier: Some(Arc::new(Barrier::new(parties))),
      ..Self::new(inner)
    }
  }
}

#[async_trait]
impl CatalogStore for HookedStore {
  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    self.inner.list_products().await
  }

  async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
    self.inner.get_product(product_id).await
  }
}

#[async_trait]
impl CartStore for HookedStore {
  async fn list_cart(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
    self.inner.list_cart(user_id).await
  }

  async fn get_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<Option<CartItem>> {
    self.inner.get_cart_item(user_id, item_id).await
  }

  async fn upsert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> StoreResult<CartItem> {
    self.inner.upsert_cart_item(user_id, product_id, quantity).await
  }

  async fn set_cart_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> StoreResult<Option<CartItem>> {
    self.inner.set_cart_quantity(user_id, item_id, quantity).await
  }

  async fn remove_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<bool> {
    self.inner.remove_cart_item(user_id, item_id).await
  }
}

#[async_trait]
impl OrderLedger for HookedStore {
  async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
    self.inner.list_orders(user_id).await
  }

  async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> StoreResult<Option<(Order, Vec<OrderItem>)>> {
    self.inner.get_order(user_id, order_id).await
  }
}

#[async_trait]
impl ShopStore for HookedStore {
  async fn begin(&self) -> StoreResult<Box<dyn CheckoutTx>> {
    self.begin_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(barrier) = &self.begin_barrier {
      barrier.wait().await;
    }
    if let Some((product_id, price_cents)) = self.reprice_on_begin {
      self.inner.set_price(product_id, price_cents).await?;
    }
    let inner = self.inner.begin().await?;
    Ok(Box::new(HookedTx {
      inner,
      fail_order_item_at: self.fail_order_item_at,
      order_items_seen: 0,
    }))
  }
}

struct HookedTx {
  inner: Box<dyn CheckoutTx>,
  fail_order_item_at: Option<usize>,
  order_items_seen: usize,
}

#[async_trait]
impl CheckoutTx for HookedTx {
  async fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order> {
    self.inner.insert_order(order).await
  }

  async fn insert_order_item(&mut self, item: &NewOrderItem) -> StoreResult<OrderItem> {
    self.order_items_seen += 1;
    if self.fail_order_item_at == Some(self.order_items_seen) {
      return Err(StoreError::Backend("induced order item failure".to_string()));
    }
    self.inner.insert_order_item(item).await
  }

  async fn decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> StoreResult<()> {
    self.inner.decrement_stock(product_id, quantity).await
  }

  async fn clear_cart(&mut self, user_id: Uuid) -> StoreResult<u64> {
    self.inner.clear_cart(user_id).await
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    self.inner.commit().await
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    self.inner.rollback().await
  }
}
