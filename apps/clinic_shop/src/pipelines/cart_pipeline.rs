// clinic_shop/src/pipelines/cart_pipeline.rs

use crate::errors::AppError;
use crate::models::{CartItem, CartLine};
use crate::pipelines::contexts::AddToCartCtxData;
use crate::pricing::{PriceBreakdown, PricingPolicy};
use crate::store::ShopStore;
use clinic_flow::{ContextData, FlowRegistry, FlowResult, Pipeline, PipelineControl, PipelineResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const ADD_TO_CART_STEPS: [&str; 4] = [
  "validate_cart_input",
  "fetch_product_for_cart",
  "check_product_stock_for_cart",
  "add_or_update_cart_item",
];

pub fn add_to_cart_pipeline() -> FlowResult<Pipeline<AddToCartCtxData, AppError>> {
  let mut p = Pipeline::<AddToCartCtxData, AppError>::new(&ADD_TO_CART_STEPS)?;

  // Step 1: quantity must be positive
  p.on("validate_cart_input", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let quantity = ctx_data.read().quantity;
    if quantity <= 0 {
      warn!(quantity, "Add to cart rejected: quantity must be positive.");
      return Err(AppError::Validation("Quantity must be a positive number.".to_string()));
    }
    Ok(PipelineControl::Continue)
  })?;

  // Step 2: product must exist
  p.on("fetch_product_for_cart", |ctx_data: ContextData<AddToCartCtxData>| async move {
    let (store, product_id) = {
      let guard = ctx_data.read();
      (guard.store.clone(), guard.product_id)
    };
    let product = store
      .get_product(product_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found.", product_id)))?;
    ctx_data.write().product_stock = Some(product.stock_quantity);
    Ok::<_, AppError>(PipelineControl::Continue)
  })?;

  // Step 3: what is already in the cart counts against stock
  p.on(
    "check_product_stock_for_cart",
    |ctx_data: ContextData<AddToCartCtxData>| async move {
      let (store, user_id, product_id, requested, stock) = {
        let guard = ctx_data.read();
        (
          guard.store.clone(),
          guard.user_id,
          guard.product_id,
          guard.quantity,
          guard.product_stock,
        )
      };
      let stock = stock.ok_or_else(|| AppError::Internal("Product stock was not loaded.".to_string()))?;
      let in_cart: i32 = store
        .list_cart(user_id)
        .await?
        .iter()
        .filter(|line| line.product_id == product_id)
        .map(|line| line.quantity)
        .sum();

      if in_cart.saturating_add(requested) > stock {
        warn!(%product_id, in_cart, requested, stock, "Add to cart rejected: insufficient stock.");
        return Err(AppError::Validation(format!(
          "Insufficient stock. Only {} available.",
          stock
        )));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    },
  )?;

  // Step 4: one line per product; an existing line is incremented
  p.on(
    "add_or_update_cart_item",
    |ctx_data: ContextData<AddToCartCtxData>| async move {
      let (store, user_id, product_id, quantity) = {
        let guard = ctx_data.read();
        (guard.store.clone(), guard.user_id, guard.product_id, guard.quantity)
      };
      let item = store.upsert_cart_item(user_id, product_id, quantity).await?;
      info!(%user_id, item_id = %item.id, quantity = item.quantity, "Cart line saved.");
      ctx_data.write().updated_cart_item = Some(item);
      Ok::<_, AppError>(PipelineControl::Continue)
    },
  )?;

  Ok(p)
}

pub fn register_add_to_cart_pipeline(registry: &FlowRegistry<AppError>) -> Result<(), AppError> {
  registry.register(add_to_cart_pipeline()?);
  info!("Add to cart pipeline registered.");
  Ok(())
}

#[instrument(name = "cart::add", skip(flows, store), err(Display))]
pub async fn add_to_cart(
  flows: &FlowRegistry<AppError>,
  store: Arc<dyn ShopStore>,
  user_id: Uuid,
  product_id: Uuid,
  quantity: i32,
) -> Result<CartItem, AppError> {
  let ctx_data = ContextData::new(AddToCartCtxData::new(store, user_id, product_id, quantity));
  match flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let item = ctx_data.read().updated_cart_item.clone();
      item.ok_or_else(|| AppError::Internal("Cart update completed, but item details are unavailable.".to_string()))
    }
    PipelineResult::Stopped => Err(AppError::PipelineHalted),
  }
}

#[instrument(name = "cart::update", skip(store), err(Display))]
pub async fn update_cart_item(
  store: &dyn ShopStore,
  user_id: Uuid,
  item_id: Uuid,
  quantity: i32,
) -> Result<CartItem, AppError> {
  if quantity <= 0 {
    return Err(AppError::Validation("Quantity must be a positive number.".to_string()));
  }
  let item = store
    .get_cart_item(user_id, item_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Cart item {} not found.", item_id)))?;
  let product = store
    .get_product(item.product_id)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Product with ID {} not found.", item.product_id)))?;
  if quantity > product.stock_quantity {
    return Err(AppError::Validation(format!(
      "Insufficient stock. Only {} available.",
      product.stock_quantity
    )));
  }
  store
    .set_cart_quantity(user_id, item_id, quantity)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Cart item {} not found.", item_id)))
}

#[instrument(name = "cart::remove", skip(store), err(Display))]
pub async fn remove_cart_item(store: &dyn ShopStore, user_id: Uuid, item_id: Uuid) -> Result<(), AppError> {
  if store.remove_cart_item(user_id, item_id).await? {
    Ok(())
  } else {
    Err(AppError::NotFound(format!("Cart item {} not found.", item_id)))
  }
}

/// The cart with a pricing preview. Checkout re-reads prices; the preview is
/// not a quote.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
  pub items: Vec<CartLine>,
  pub totals: PriceBreakdown,
}

pub async fn view_cart(store: &dyn ShopStore, pricing: &PricingPolicy, user_id: Uuid) -> Result<CartView, AppError> {
  let items = store.list_cart(user_id).await?;
  // An empty cart has nothing to ship.
  let totals = if items.is_empty() {
    PriceBreakdown::default()
  } else {
    pricing.price(items.iter().map(|line| (line.unit_price_cents, line.quantity)))
  };
  Ok(CartView { items, totals })
}
