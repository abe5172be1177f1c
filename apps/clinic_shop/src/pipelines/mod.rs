// clinic_shop/src/pipelines/mod.rs

//! Shop workflows expressed as `clinic_flow` pipelines, and the plain async
//! cart operations that need no step sequencing.

use crate::errors::AppError;
use clinic_flow::FlowRegistry;

pub mod cart_pipeline;
pub mod checkout_pipeline;
pub mod contexts;

/// Registers every shop pipeline. Called once at startup.
pub fn register_all_pipelines(registry: &FlowRegistry<AppError>) -> Result<(), AppError> {
  tracing::info!("Registering shop pipelines...");
  checkout_pipeline::register_checkout_pipeline(registry)?;
  cart_pipeline::register_add_to_cart_pipeline(registry)?;
  tracing::info!("All shop pipelines registered.");
  Ok(())
}
