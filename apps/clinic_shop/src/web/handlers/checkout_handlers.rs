// clinic_shop/src/web/handlers/checkout_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::cents_to_amount;
use crate::pipelines::checkout_pipeline::run_checkout;
use crate::pipelines::contexts::CheckoutRequest;
use crate::state::AppState;
use crate::web::extractors::AuthenticatedUser;

/// `POST /shop/checkout`. The body is optional; absent fields are stored empty.
/// A body that is present but not a valid `CheckoutRequest` is rejected before
/// the cart is read.
#[instrument(
    name = "handler::checkout",
    skip(app_state, auth_user, req_payload),
    fields(user_id = %auth_user.user_id)
)]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Bytes,
) -> Result<HttpResponse, AppError> {
  let request = parse_checkout_request(&req_payload)?;
  let summary = run_checkout(app_state.get_ref(), auth_user.user_id, request).await?;

  info!(order_id = %summary.order_id, total_cents = summary.total_cents, "Checkout succeeded.");
  Ok(HttpResponse::Created().json(json!({
      "orderId": summary.order_id,
      "message": summary.message,
      "total": cents_to_amount(summary.total_cents),
      "totalCents": summary.total_cents,
  })))
}

fn parse_checkout_request(body: &[u8]) -> Result<CheckoutRequest, AppError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(CheckoutRequest::default());
  }
  serde_json::from_slice(body).map_err(|e| {
    warn!(error = %e, "Rejected malformed checkout body.");
    AppError::Validation(format!("Invalid checkout request body: {}", e))
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_body_means_no_details() {
    assert_eq!(parse_checkout_request(b"").unwrap(), CheckoutRequest::default());
    assert_eq!(parse_checkout_request(b" \n").unwrap(), CheckoutRequest::default());
  }

  #[test]
  fn wrong_field_type_is_a_validation_error() {
    let err = parse_checkout_request(br#"{"shippingAddress": 12345}"#).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
  }

  #[test]
  fn partial_body_keeps_given_fields() {
    let request = parse_checkout_request(br#"{"paymentMethod": "card"}"#).unwrap();
    assert_eq!(request.payment_method.as_deref(), Some("card"));
    assert_eq!(request.shipping_address, None);
  }
}
