// tests/registry_tests.rs
mod common;

use clinic_flow::{ContextData, FlowRegistry, Pipeline, PipelineControl, PipelineResult};
use common::*;

#[derive(Clone, Debug, Default)]
struct AlphaCtx {
  val: String,
}

#[derive(Clone, Debug, Default)]
struct BetaCtx {
  num: i32,
}

fn alpha_pipeline() -> Pipeline<AlphaCtx, TestError> {
  let mut p = Pipeline::<AlphaCtx, TestError>::new(&["alpha_task"]).unwrap();
  p.on("alpha_task", |ctx: ContextData<AlphaCtx>| async move {
    ctx.write().val = "alpha_processed".to_string();
    Ok::<_, TestError>(PipelineControl::Continue)
  })
  .unwrap();
  p
}

fn beta_pipeline() -> Pipeline<BetaCtx, TestError> {
  let mut p = Pipeline::<BetaCtx, TestError>::new(&["beta_task"]).unwrap();
  p.on("beta_task", |ctx: ContextData<BetaCtx>| async move {
    ctx.write().num = 100;
    Ok::<_, TestError>(PipelineControl::Stop)
  })
  .unwrap();
  p
}

#[tokio::test]
async fn registry_dispatches_on_context_type() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  registry.register(alpha_pipeline());
  registry.register(beta_pipeline());
  assert!(registry.is_registered::<AlphaCtx>());
  assert!(registry.is_registered::<BetaCtx>());

  let alpha = ContextData::new(AlphaCtx::default());
  assert_eq!(registry.run(alpha.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(alpha.read().val, "alpha_processed");

  let beta = ContextData::new(BetaCtx::default());
  assert_eq!(registry.run(beta.clone()).await.unwrap(), PipelineResult::Stopped);
  assert_eq!(beta.read().num, 100);
}

#[tokio::test]
async fn running_an_unregistered_context_is_an_error() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  registry.register(alpha_pipeline());

  let result = registry.run(ContextData::new(BetaCtx::default())).await;

  match result {
    Err(TestError::Flow(message)) => {
      assert!(message.contains("NotRegistered"));
      assert!(message.contains("BetaCtx"));
    }
    other => panic!("expected NotRegistered, got {:?}", other),
  }
}

#[tokio::test]
async fn re_registering_replaces_the_previous_pipeline() {
  setup_tracing();
  let registry = FlowRegistry::<TestError>::new();
  registry.register(alpha_pipeline());

  let mut replacement = Pipeline::<AlphaCtx, TestError>::new(&["other_task"]).unwrap();
  replacement
    .on("other_task", |ctx: ContextData<AlphaCtx>| async move {
      ctx.write().val = "replacement".to_string();
      Ok::<_, TestError>(PipelineControl::Continue)
    })
    .unwrap();
  registry.register(replacement);

  let ctx = ContextData::new(AlphaCtx::default());
  registry.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().val, "replacement");
}
