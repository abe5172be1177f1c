// clinic_shop/src/store/memory.rs

//! In-process `ShopStore`.
//!
//! All state sits behind one async mutex. A checkout transaction takes the
//! mutex for its whole lifetime and writes to a staged copy; `commit` swaps the
//! copy in, anything else throws it away. Transactions are therefore fully
//! serialized, which gives the same guarantees the guarded decrement gets from
//! Postgres row locks.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{CartStore, CatalogStore, CheckoutTx, OrderLedger, ShopStore, StoreError, StoreResult};
use crate::models::{CartItem, CartLine, NewOrder, NewOrderItem, Order, OrderItem, Product};

#[derive(Debug, Clone, Default)]
struct ShopState {
  products: BTreeMap<Uuid, Product>,
  cart_items: Vec<CartItem>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  state: Arc<Mutex<ShopState>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a product and returns its id.
  pub async fn add_product(&self, name: &str, price_cents: i64, stock_quantity: i32) -> Uuid {
    let mut state = self.state.lock().await;
    let now = Utc::now();
    let product = Product {
      id: Uuid::new_v4(),
      name: name.to_string(),
      description: None,
      price_cents,
      stock_quantity,
      created_at: now,
      updated_at: now,
    };
    let id = product.id;
    state.products.insert(id, product);
    id
  }

  pub async fn set_price(&self, product_id: Uuid, price_cents: i64) -> StoreResult<()> {
    self.with_product(product_id, |p| p.price_cents = price_cents).await
  }

  pub async fn set_stock(&self, product_id: Uuid, stock_quantity: i32) -> StoreResult<()> {
    self.with_product(product_id, |p| p.stock_quantity = stock_quantity).await
  }

  async fn with_product(&self, product_id: Uuid, f: impl FnOnce(&mut Product)) -> StoreResult<()> {
    let mut state = self.state.lock().await;
    let now = Utc::now();
    let product = state
      .products
      .get_mut(&product_id)
      .ok_or_else(|| StoreError::Backend(format!("unknown product {product_id}")))?;
    f(product);
    product.updated_at = now;
    Ok(())
  }

  pub async fn stock_of(&self, product_id: Uuid) -> Option<i32> {
    self.state.lock().await.products.get(&product_id).map(|p| p.stock_quantity)
  }

  pub async fn order_count(&self) -> usize {
    self.state.lock().await.orders.len()
  }

  pub async fn order_item_count(&self) -> usize {
    self.state.lock().await.order_items.len()
  }

  pub async fn cart_items(&self, user_id: Uuid) -> Vec<CartItem> {
    let state = self.state.lock().await;
    state.cart_items.iter().filter(|c| c.user_id == user_id).cloned().collect()
  }
}

#[async_trait]
impl CatalogStore for MemoryStore {
  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    let state = self.state.lock().await;
    let mut products: Vec<Product> = state.products.values().cloned().collect();
    products.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(products)
  }

  async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
    Ok(self.state.lock().await.products.get(&product_id).cloned())
  }
}

#[async_trait]
impl CartStore for MemoryStore {
  async fn list_cart(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
    let state = self.state.lock().await;
    // Stable sort: lines added in the same instant keep insertion order.
    let mut items: Vec<&CartItem> = state.cart_items.iter().filter(|c| c.user_id == user_id).collect();
    items.sort_by_key(|c| c.added_at);

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
      // Mirrors the inner join: a cart row whose product vanished is not listed.
      let Some(product) = state.products.get(&item.product_id) else {
        continue;
      };
      lines.push(CartLine {
        id: item.id,
        user_id: item.user_id,
        product_id: item.product_id,
        product_name: product.name.clone(),
        quantity: item.quantity,
        unit_price_cents: product.price_cents,
        stock_quantity: product.stock_quantity,
      });
    }
    Ok(lines)
  }

  async fn get_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<Option<CartItem>> {
    let state = self.state.lock().await;
    Ok(state.cart_items.iter().find(|c| c.id == item_id && c.user_id == user_id).cloned())
  }

  async fn upsert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> StoreResult<CartItem> {
    let mut state = self.state.lock().await;
    if !state.products.contains_key(&product_id) {
      return Err(StoreError::Backend(format!("unknown product {product_id}")));
    }
    if let Some(existing) = state
      .cart_items
      .iter_mut()
      .find(|c| c.user_id == user_id && c.product_id == product_id)
    {
      existing.quantity += quantity;
      return Ok(existing.clone());
    }
    let item = CartItem {
      id: Uuid::new_v4(),
      user_id,
      product_id,
      quantity,
      added_at: Utc::now(),
    };
    state.cart_items.push(item.clone());
    Ok(item)
  }

  async fn set_cart_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> StoreResult<Option<CartItem>> {
    let mut state = self.state.lock().await;
    Ok(
      state
        .cart_items
        .iter_mut()
        .find(|c| c.id == item_id && c.user_id == user_id)
        .map(|item| {
          item.quantity = quantity;
          item.clone()
        }),
    )
  }

  async fn remove_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<bool> {
    let mut state = self.state.lock().await;
    let before = state.cart_items.len();
    state.cart_items.retain(|c| !(c.id == item_id && c.user_id == user_id));
    Ok(state.cart_items.len() != before)
  }
}

#[async_trait]
impl OrderLedger for MemoryStore {
  async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
    let state = self.state.lock().await;
    let mut orders: Vec<Order> = state.orders.iter().rev().filter(|o| o.user_id == user_id).cloned().collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(orders)
  }

  async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> StoreResult<Option<(Order, Vec<OrderItem>)>> {
    let state = self.state.lock().await;
    let Some(order) = state.orders.iter().find(|o| o.id == order_id && o.user_id == user_id) else {
      return Ok(None);
    };
    let items = state.order_items.iter().filter(|i| i.order_id == order_id).cloned().collect();
    Ok(Some((order.clone(), items)))
  }
}

#[async_trait]
impl ShopStore for MemoryStore {
  async fn begin(&self) -> StoreResult<Box<dyn CheckoutTx>> {
    let guard = Arc::clone(&self.state).lock_owned().await;
    let staged = guard.clone();
    debug!("Memory transaction opened.");
    Ok(Box::new(MemoryCheckoutTx { live: guard, staged }))
  }
}

/// Holds the store lock until commit or drop.
pub struct MemoryCheckoutTx {
  live: OwnedMutexGuard<ShopState>,
  staged: ShopState,
}

#[async_trait]
impl CheckoutTx for MemoryCheckoutTx {
  async fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order> {
    if self.staged.orders.iter().any(|o| o.id == order.id) {
      return Err(StoreError::Backend(format!("duplicate order id {}", order.id)));
    }
    let row = Order {
      id: order.id,
      user_id: order.user_id,
      status: order.status,
      subtotal_cents: order.totals.subtotal_cents,
      tax_cents: order.totals.tax_cents,
      shipping_cents: order.totals.shipping_cents,
      total_cents: order.totals.total_cents,
      shipping_address: order.shipping_address.clone(),
      billing_address: order.billing_address.clone(),
      payment_method: order.payment_method.clone(),
      created_at: Utc::now(),
    };
    self.staged.orders.push(row.clone());
    Ok(row)
  }

  async fn insert_order_item(&mut self, item: &NewOrderItem) -> StoreResult<OrderItem> {
    if !self.staged.orders.iter().any(|o| o.id == item.order_id) {
      return Err(StoreError::Backend(format!("order {} does not exist", item.order_id)));
    }
    let row = OrderItem {
      id: Uuid::new_v4(),
      order_id: item.order_id,
      product_id: item.product_id,
      quantity: item.quantity,
      price_at_purchase_cents: item.price_at_purchase_cents,
    };
    self.staged.order_items.push(row.clone());
    Ok(row)
  }

  async fn decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> StoreResult<()> {
    let now = Utc::now();
    match self.staged.products.get_mut(&product_id) {
      Some(product) if product.stock_quantity >= quantity => {
        product.stock_quantity -= quantity;
        product.updated_at = now;
        Ok(())
      }
      _ => {
        warn!(%product_id, quantity, "Guarded stock decrement matched no row.");
        Err(StoreError::StockConflict { product_id })
      }
    }
  }

  async fn clear_cart(&mut self, user_id: Uuid) -> StoreResult<u64> {
    let before = self.staged.cart_items.len();
    self.staged.cart_items.retain(|c| c.user_id != user_id);
    Ok((before - self.staged.cart_items.len()) as u64)
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    let MemoryCheckoutTx { mut live, staged } = *self;
    *live = staged;
    debug!("Memory transaction committed.");
    Ok(())
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    debug!("Memory transaction rolled back.");
    Ok(())
  }
}
