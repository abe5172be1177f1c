// clinic_shop/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

use crate::pricing::PriceBreakdown;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, SqlxType)]
#[sqlx(type_name = "order_status_enum", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  #[default]
  Pending,
  Paid,
  Shipped,
  Delivered,
  Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub status: OrderStatus,
  pub subtotal_cents: i64,
  pub tax_cents: i64,
  pub shipping_cents: i64,
  pub total_cents: i64,
  pub shipping_address: String,
  pub billing_address: String,
  pub payment_method: String,
  pub created_at: DateTime<Utc>,
}

/// Values for the single `orders` insert made by a checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
  pub id: Uuid,
  pub user_id: Uuid,
  pub status: OrderStatus,
  pub totals: PriceBreakdown,
  pub shipping_address: String,
  pub billing_address: String,
  pub payment_method: String,
}

/// What a successful checkout hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
  pub order_id: Uuid,
  pub total_cents: i64,
  pub message: &'static str,
}
