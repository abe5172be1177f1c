// clinic_shop/src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use super::{CartStore, CatalogStore, CheckoutTx, OrderLedger, ShopStore, StoreError, StoreResult};
use crate::models::{CartItem, CartLine, NewOrder, NewOrderItem, Order, OrderItem, Product};

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, stock_quantity, created_at, updated_at";
const CART_ITEM_COLUMNS: &str = "id, user_id, product_id, quantity, added_at";
const ORDER_COLUMNS: &str = "id, user_id, status, subtotal_cents, tax_cents, shipping_cents, total_cents, \
   shipping_address, billing_address, payment_method, created_at";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price_at_purchase_cents";

/// `ShopStore` over a Postgres pool. Queries are checked at runtime.
#[derive(Debug, Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl CatalogStore for PgStore {
  #[instrument(name = "pg::list_products", skip(self), err(Display))]
  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name ASC"))
      .fetch_all(&self.pool)
      .await?;
    Ok(products)
  }

  #[instrument(name = "pg::get_product", skip(self), err(Display))]
  async fn get_product(&self, product_id: Uuid) -> StoreResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
      .bind(product_id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(product)
  }
}

#[async_trait]
impl CartStore for PgStore {
  #[instrument(name = "pg::list_cart", skip(self), err(Display))]
  async fn list_cart(&self, user_id: Uuid) -> StoreResult<Vec<CartLine>> {
    let lines = sqlx::query_as::<_, CartLine>(
      r#"
      SELECT c.id, c.user_id, c.product_id, p.name AS product_name, c.quantity,
             p.price_cents AS unit_price_cents, p.stock_quantity
      FROM cart_items c
      JOIN products p ON p.id = c.product_id
      WHERE c.user_id = $1
      ORDER BY c.added_at ASC, c.id ASC
      "#,
    )
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    debug!(lines = lines.len(), "Cart loaded.");
    Ok(lines)
  }

  #[instrument(name = "pg::get_cart_item", skip(self), err(Display))]
  async fn get_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(&format!(
      "SELECT {CART_ITEM_COLUMNS} FROM cart_items WHERE id = $1 AND user_id = $2"
    ))
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(item)
  }

  #[instrument(name = "pg::upsert_cart_item", skip(self), err(Display))]
  async fn upsert_cart_item(&self, user_id: Uuid, product_id: Uuid, quantity: i32) -> StoreResult<CartItem> {
    let item = sqlx::query_as::<_, CartItem>(&format!(
      r#"
      INSERT INTO cart_items (id, user_id, product_id, quantity, added_at)
      VALUES ($1, $2, $3, $4, NOW())
      ON CONFLICT (user_id, product_id) DO UPDATE
      SET quantity = cart_items.quantity + EXCLUDED.quantity
      RETURNING {CART_ITEM_COLUMNS}
      "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(&self.pool)
    .await?;
    Ok(item)
  }

  #[instrument(name = "pg::set_cart_quantity", skip(self), err(Display))]
  async fn set_cart_quantity(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> StoreResult<Option<CartItem>> {
    let item = sqlx::query_as::<_, CartItem>(&format!(
      "UPDATE cart_items SET quantity = $1 WHERE id = $2 AND user_id = $3 RETURNING {CART_ITEM_COLUMNS}"
    ))
    .bind(quantity)
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await?;
    Ok(item)
  }

  #[instrument(name = "pg::remove_cart_item", skip(self), err(Display))]
  async fn remove_cart_item(&self, user_id: Uuid, item_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND user_id = $2")
      .bind(item_id)
      .bind(user_id)
      .execute(&self.pool)
      .await?;
    Ok(result.rows_affected() == 1)
  }
}

#[async_trait]
impl OrderLedger for PgStore {
  #[instrument(name = "pg::list_orders", skip(self), err(Display))]
  async fn list_orders(&self, user_id: Uuid) -> StoreResult<Vec<Order>> {
    let orders = sqlx::query_as::<_, Order>(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    Ok(orders)
  }

  #[instrument(name = "pg::get_order", skip(self), err(Display))]
  async fn get_order(&self, user_id: Uuid, order_id: Uuid) -> StoreResult<Option<(Order, Vec<OrderItem>)>> {
    let order = sqlx::query_as::<_, Order>(&format!(
      "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
    ))
    .bind(order_id)
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await?;

    let Some(order) = order else {
      return Ok(None);
    };

    let items = sqlx::query_as::<_, OrderItem>(&format!(
      "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
    ))
    .bind(order.id)
    .fetch_all(&self.pool)
    .await?;
    Ok(Some((order, items)))
  }
}

#[async_trait]
impl ShopStore for PgStore {
  #[instrument(name = "pg::begin", skip(self), err(Display))]
  async fn begin(&self) -> StoreResult<Box<dyn CheckoutTx>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgCheckoutTx { tx }))
  }
}

/// Checkout writes inside one Postgres transaction. sqlx rolls the
/// transaction back if it is dropped before `commit`.
pub struct PgCheckoutTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl CheckoutTx for PgCheckoutTx {
  async fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order> {
    let row = sqlx::query_as::<_, Order>(&format!(
      r#"
      INSERT INTO orders (id, user_id, status, subtotal_cents, tax_cents, shipping_cents, total_cents,
                          shipping_address, billing_address, payment_method, created_at)
      VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW())
      RETURNING {ORDER_COLUMNS}
      "#
    ))
    .bind(order.id)
    .bind(order.user_id)
    .bind(order.status)
    .bind(order.totals.subtotal_cents)
    .bind(order.totals.tax_cents)
    .bind(order.totals.shipping_cents)
    .bind(order.totals.total_cents)
    .bind(&order.shipping_address)
    .bind(&order.billing_address)
    .bind(&order.payment_method)
    .fetch_one(&mut *self.tx)
    .await?;
    Ok(row)
  }

  async fn insert_order_item(&mut self, item: &NewOrderItem) -> StoreResult<OrderItem> {
    let row = sqlx::query_as::<_, OrderItem>(&format!(
      r#"
      INSERT INTO order_items (id, order_id, product_id, quantity, price_at_purchase_cents)
      VALUES ($1, $2, $3, $4, $5)
      RETURNING {ORDER_ITEM_COLUMNS}
      "#
    ))
    .bind(Uuid::new_v4())
    .bind(item.order_id)
    .bind(item.product_id)
    .bind(item.quantity)
    .bind(item.price_at_purchase_cents)
    .fetch_one(&mut *self.tx)
    .await?;
    Ok(row)
  }

  async fn decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> StoreResult<()> {
    // Concurrent checkouts on the same row queue on its lock and re-check the
    // guard once the earlier transaction commits.
    let result = sqlx::query(
      r#"
      UPDATE products
      SET stock_quantity = stock_quantity - $1, updated_at = NOW()
      WHERE id = $2 AND stock_quantity >= $1
      "#,
    )
    .bind(quantity)
    .bind(product_id)
    .execute(&mut *self.tx)
    .await?;

    if result.rows_affected() != 1 {
      warn!(%product_id, quantity, "Guarded stock decrement matched no row.");
      return Err(StoreError::StockConflict { product_id });
    }
    Ok(())
  }

  async fn clear_cart(&mut self, user_id: Uuid) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
      .bind(user_id)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected())
  }

  async fn commit(self: Box<Self>) -> StoreResult<()> {
    self.tx.commit().await.map_err(|e| {
      error!(error = %e, "Commit failed.");
      StoreError::Database(e)
    })
  }

  async fn rollback(self: Box<Self>) -> StoreResult<()> {
    self.tx.rollback().await?;
    Ok(())
  }
}
