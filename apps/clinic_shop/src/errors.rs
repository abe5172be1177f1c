// clinic_shop/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;
use clinic_flow::FlowError;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Cart is empty")]
  EmptyCart,

  #[error("Not enough stock available for product {product_id}")]
  InsufficientStock { product_id: Uuid },

  /// The checkout transaction failed and was rolled back.
  #[error("Checkout failed: {source}")]
  CheckoutFailed { source: StoreError },

  #[error("Storage Error: {0}")]
  Store(#[from] StoreError),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),

  /// A pipeline returned `Stopped` where the caller needed it to complete.
  /// None of the shop's registered handlers stop early, so this only fires
  /// if a future handler does.
  #[error("Pipeline execution was halted by a handler.")]
  PipelineHalted,
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::EmptyCart | AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::PipelineHalted => StatusCode::CONFLICT,
      AppError::Config(_)
      | AppError::CheckoutFailed { .. }
      | AppError::Store(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }

    let body = match self {
      AppError::Validation(m) | AppError::Auth(m) | AppError::NotFound(m) => json!({ "error": m }),
      AppError::EmptyCart => json!({ "error": "Cart is empty" }),
      AppError::InsufficientStock { product_id } => json!({
        "error": "Not enough stock available for some items",
        "itemId": product_id,
      }),
      AppError::CheckoutFailed { .. } => json!({ "error": "Checkout failed; no changes were made" }),
      AppError::Store(_) => json!({ "error": "Database operation failed" }),
      AppError::Workflow { source } => {
        tracing::error!(flow_error = ?source, "Workflow error details");
        json!({ "error": "Workflow processing error" })
      }
      AppError::Config(_) | AppError::Internal(_) => json!({ "error": "An internal error occurred" }),
      AppError::PipelineHalted => json!({ "error": "Process halted by business logic." }),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::body::to_bytes;

  async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
    let resp = err.error_response();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[actix_web::test]
  async fn empty_cart_maps_to_400() {
    let (status, body) = body_json(AppError::EmptyCart).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Cart is empty" }));
  }

  #[actix_web::test]
  async fn insufficient_stock_names_the_product() {
    let product_id = Uuid::new_v4();
    let (status, body) = body_json(AppError::InsufficientStock { product_id }).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Not enough stock available for some items");
    assert_eq!(body["itemId"], product_id.to_string());
  }

  #[actix_web::test]
  async fn checkout_failure_hides_storage_detail() {
    let source = StoreError::Backend("connection reset".to_string());
    let (status, body) = body_json(AppError::CheckoutFailed { source }).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["error"].as_str().unwrap().contains("connection reset"));
  }

  #[actix_web::test]
  async fn halted_pipeline_is_409() {
    let (status, body) = body_json(AppError::PipelineHalted).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Process halted by business logic.");
  }

  #[test]
  fn flow_errors_convert_into_workflow() {
    let err: AppError = FlowError::NotRegistered {
      type_name: "X".to_string(),
    }
    .into();
    assert!(matches!(err, AppError::Workflow { .. }));
  }
}
