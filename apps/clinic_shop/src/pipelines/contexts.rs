// clinic_shop/src/pipelines/contexts.rs

//! Data threaded through the shop pipelines. Handlers receive these wrapped in
//! `clinic_flow::ContextData`.

use crate::models::{CartItem, CartLine, OrderSummary};
use crate::pricing::{PriceBreakdown, PricingPolicy};
use crate::store::ShopStore;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Optional order details supplied by the caller. Missing fields are stored
/// as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
  pub shipping_address: Option<String>,
  pub billing_address: Option<String>,
  pub payment_method: Option<String>,
}

/// Where a checkout run is.
///
/// `Validating → Pricing → Committing → Committed`, or `RolledBack` when the
/// transaction fails. Client errors leave the run in `Validating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
  #[default]
  Validating,
  Pricing,
  Committing,
  Committed,
  RolledBack,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub store: Arc<dyn ShopStore>,
  pub pricing: PricingPolicy,
  pub user_id: Uuid,
  pub request: CheckoutRequest,
  pub phase: CheckoutPhase,
  /// Cart as read at the start of the run. Prices here are the ones recorded.
  pub lines: Vec<CartLine>,
  pub breakdown: Option<PriceBreakdown>,
  pub summary: Option<OrderSummary>,
}

impl CheckoutCtxData {
  pub fn new(store: Arc<dyn ShopStore>, pricing: PricingPolicy, user_id: Uuid, request: CheckoutRequest) -> Self {
    Self {
      store,
      pricing,
      user_id,
      request,
      phase: CheckoutPhase::default(),
      lines: Vec::new(),
      breakdown: None,
      summary: None,
    }
  }
}

#[derive(Clone)]
pub struct AddToCartCtxData {
  pub store: Arc<dyn ShopStore>,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub quantity: i32,
  /// Stock read by `fetch_product_for_cart`.
  pub product_stock: Option<i32>,
  pub updated_cart_item: Option<CartItem>,
}

impl AddToCartCtxData {
  pub fn new(store: Arc<dyn ShopStore>, user_id: Uuid, product_id: Uuid, quantity: i32) -> Self {
    Self {
      store,
      user_id,
      product_id,
      quantity,
      product_stock: None,
      updated_cart_item: None,
    }
  }
}
