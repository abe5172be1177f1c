// clinic_shop/src/state.rs

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::store::ShopStore;
use clinic_flow::FlowRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn ShopStore>,
  pub flows: Arc<FlowRegistry<AppError>>,
  pub config: Arc<AppConfig>,
}
