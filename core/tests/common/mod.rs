// tests/common/mod.rs
#![allow(dead_code)]

use clinic_flow::{ContextData, FlowError, PipelineControl};
use once_cell::sync::Lazy;
use std::future::Future;
use std::pin::Pin;
use tracing::Level;

pub type TestFuture = Pin<Box<dyn Future<Output = Result<PipelineControl, TestError>> + Send>>;

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub trail: Vec<String>,
  pub stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String),

  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Flow(format!("{:?}", err))
  }
}

/// Handler that records `label` in the trail and honours `stop_at`.
pub fn recording_handler(
  label: &'static str,
) -> impl Fn(ContextData<TestContext>) -> TestFuture + Send + Sync + 'static {
  move |ctx: ContextData<TestContext>| -> TestFuture {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.trail.push(label.to_string());
      tracing::debug!(target: "test_handlers", %label, counter = guard.counter, "executed");
      if guard.stop_at.as_deref() == Some(label) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  }
}

pub fn failing_handler(
  label: &'static str,
) -> impl Fn(ContextData<TestContext>) -> TestFuture + Send + Sync + 'static {
  move |ctx: ContextData<TestContext>| -> TestFuture {
    Box::pin(async move {
      ctx.write().trail.push(label.to_string());
      Err(TestError::Handler(format!("{label} failed")))
    })
  }
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
