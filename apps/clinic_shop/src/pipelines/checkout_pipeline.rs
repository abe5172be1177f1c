// clinic_shop/src/pipelines/checkout_pipeline.rs

//! Checkout: turns a user's cart into an order.
//!
//! ```text
//!   load_cart       Validating   read cart lines with live price and stock
//!   validate_stock  Validating   every line must fit in current stock
//!   price_order     Pricing      subtotal, tax, shipping, total
//!   commit_order    Committing   one transaction: order, order items,
//!                                guarded stock decrements, cart delete
//! ```
//!
//! `EmptyCart` and `InsufficientStock` are raised before the transaction opens
//! and leave no trace. Anything that fails inside `commit_order` rolls the whole
//! transaction back and surfaces as `CheckoutFailed`.

use crate::errors::AppError;
use crate::models::{NewOrder, NewOrderItem, OrderStatus, OrderSummary};
use crate::pipelines::contexts::{CheckoutCtxData, CheckoutPhase, CheckoutRequest};
use crate::pricing::PricingPolicy;
use crate::state::AppState;
use crate::store::{CheckoutTx, ShopStore, StoreResult};
use clinic_flow::{ContextData, FlowRegistry, FlowResult, Pipeline, PipelineControl, PipelineResult};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

pub const CHECKOUT_STEPS: [&str; 4] = ["load_cart", "validate_stock", "price_order", "commit_order"];

pub const SUCCESS_MESSAGE: &str = "success";

pub fn checkout_pipeline() -> FlowResult<Pipeline<CheckoutCtxData, AppError>> {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&CHECKOUT_STEPS)?;
  p.on("load_cart", load_cart)?;
  p.on("validate_stock", validate_stock)?;
  p.on("price_order", price_order)?;
  p.before("commit_order", enter_committing)?;
  p.on("commit_order", commit_order)?;
  p.after("commit_order", log_committed)?;
  Ok(p)
}

pub fn register_checkout_pipeline(registry: &FlowRegistry<AppError>) -> Result<(), AppError> {
  registry.register(checkout_pipeline()?);
  info!("Checkout pipeline registered.");
  Ok(())
}

/// Runs checkout for `user_id` with the store and pricing held in `state`.
pub async fn run_checkout(state: &AppState, user_id: Uuid, request: CheckoutRequest) -> Result<OrderSummary, AppError> {
  checkout(&state.flows, state.store.clone(), state.config.pricing, user_id, request).await
}

#[instrument(name = "checkout", skip(flows, store, pricing, request), fields(user_id = %user_id), err(Display))]
pub async fn checkout(
  flows: &FlowRegistry<AppError>,
  store: Arc<dyn ShopStore>,
  pricing: PricingPolicy,
  user_id: Uuid,
  request: CheckoutRequest,
) -> Result<OrderSummary, AppError> {
  let ctx_data = ContextData::new(CheckoutCtxData::new(store, pricing, user_id, request));

  match flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => {
      let summary = ctx_data.read().summary.clone();
      summary.ok_or_else(|| {
        error!("Checkout pipeline completed without an order summary.");
        AppError::Internal("Checkout completed, but the order summary is unavailable.".to_string())
      })
    }
    PipelineResult::Stopped => {
      warn!(phase = ?ctx_data.read().phase, "Checkout pipeline was stopped by a handler.");
      Err(AppError::PipelineHalted)
    }
  }
}

async fn load_cart(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let (store, user_id) = {
    let guard = ctx_data.read();
    (guard.store.clone(), guard.user_id)
  };

  let lines = store.list_cart(user_id).await?;
  if lines.is_empty() {
    info!(%user_id, "Checkout rejected: cart is empty.");
    return Err(AppError::EmptyCart);
  }
  debug!(%user_id, lines = lines.len(), "Cart loaded for checkout.");

  ctx_data.write().lines = lines;
  Ok(PipelineControl::Continue)
}

async fn validate_stock(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let shortfall = {
    let guard = ctx_data.read();
    guard
      .lines
      .iter()
      .find(|line| !line.has_enough_stock())
      .map(|line| (line.product_id, line.quantity, line.stock_quantity))
  };

  if let Some((product_id, requested, available)) = shortfall {
    info!(%product_id, requested, available, "Checkout rejected: insufficient stock.");
    return Err(AppError::InsufficientStock { product_id });
  }
  Ok(PipelineControl::Continue)
}

async fn price_order(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let mut guard = ctx_data.write();
  guard.phase = CheckoutPhase::Pricing;
  let breakdown = guard
    .pricing
    .price(guard.lines.iter().map(|line| (line.unit_price_cents, line.quantity)));
  debug!(
    subtotal = breakdown.subtotal_cents,
    tax = breakdown.tax_cents,
    shipping = breakdown.shipping_cents,
    total = breakdown.total_cents,
    "Order priced."
  );
  guard.breakdown = Some(breakdown);
  Ok(PipelineControl::Continue)
}

async fn enter_committing(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  ctx_data.write().phase = CheckoutPhase::Committing;
  Ok(PipelineControl::Continue)
}

async fn commit_order(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let (store, user_id, request, lines, breakdown) = {
    let guard = ctx_data.read();
    (
      guard.store.clone(),
      guard.user_id,
      guard.request.clone(),
      guard.lines.clone(),
      guard.breakdown,
    )
  };
  let totals = breakdown.ok_or_else(|| AppError::Internal("commit_order ran before price_order".to_string()))?;

  let order = NewOrder {
    id: Uuid::new_v4(),
    user_id,
    status: OrderStatus::Pending,
    totals,
    shipping_address: request.shipping_address.unwrap_or_default(),
    billing_address: request.billing_address.unwrap_or_default(),
    payment_method: request.payment_method.unwrap_or_default(),
  };
  let items: Vec<NewOrderItem> = lines
    .iter()
    .map(|line| NewOrderItem {
      order_id: order.id,
      product_id: line.product_id,
      quantity: line.quantity,
      price_at_purchase_cents: line.unit_price_cents,
    })
    .collect();

  let outcome = match store.begin().await {
    Ok(mut tx) => match write_order(&mut *tx, &order, &items).await {
      Ok(()) => tx.commit().await,
      Err(cause) => {
        if let Err(rollback_err) = tx.rollback().await {
          warn!(error = %rollback_err, "Explicit rollback failed; the transaction is discarded on drop.");
        }
        Err(cause)
      }
    },
    Err(cause) => Err(cause),
  };

  match outcome {
    Ok(()) => {
      let mut guard = ctx_data.write();
      guard.phase = CheckoutPhase::Committed;
      guard.summary = Some(OrderSummary {
        order_id: order.id,
        total_cents: totals.total_cents,
        message: SUCCESS_MESSAGE,
      });
      Ok(PipelineControl::Continue)
    }
    Err(source) => {
      ctx_data.write().phase = CheckoutPhase::RolledBack;
      error!(order_id = %order.id, %user_id, error = %source, "Checkout transaction rolled back.");
      Err(AppError::CheckoutFailed { source })
    }
  }
}

/// The four writes of a checkout, in order. Stops at the first failure.
async fn write_order(tx: &mut dyn CheckoutTx, order: &NewOrder, items: &[NewOrderItem]) -> StoreResult<()> {
  tx.insert_order(order).await?;
  for item in items {
    tx.insert_order_item(item).await?;
  }
  for item in items {
    tx.decrement_stock(item.product_id, item.quantity).await?;
  }
  let cleared = tx.clear_cart(order.user_id).await?;
  debug!(order_id = %order.id, cleared, "Order rows written, cart cleared.");
  Ok(())
}

async fn log_committed(ctx_data: ContextData<CheckoutCtxData>) -> Result<PipelineControl, AppError> {
  let (user_id, summary) = {
    let guard = ctx_data.read();
    (guard.user_id, guard.summary.clone())
  };
  if let Some(summary) = summary {
    info!(%user_id, order_id = %summary.order_id, total_cents = summary.total_cents, "Checkout committed.");
  }
  Ok(PipelineControl::Continue)
}
