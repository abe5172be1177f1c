// clinic_flow/src/pipeline/definition.rs

use crate::core::step::StepDef;
use crate::error::{FlowError, FlowResult};

/// An ordered list of named steps over the context data type `TData`.
///
/// `Err` is what handlers return and what `run` reports. It must absorb
/// `FlowError` so the runner can surface its own failures (a step left without
/// handlers, for instance) through the same channel.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<TData, Err>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Creates a pipeline with the given steps, in execution order.
  pub fn new(step_names: &[&str]) -> FlowResult<Self> {
    let mut pipeline = Self { steps: Vec::with_capacity(step_names.len()) };
    for name in step_names {
      pipeline.push_step(name)?;
    }
    Ok(pipeline)
  }

  /// Appends a step after the existing ones.
  pub fn push_step(&mut self, step_name: &str) -> FlowResult<()> {
    if self.steps.iter().any(|s| s.name == step_name) {
      return Err(FlowError::DuplicateStep {
        step_name: step_name.to_string(),
      });
    }
    self.steps.push(StepDef::new(step_name));
    Ok(())
  }

  pub fn step_names(&self) -> impl Iterator<Item = &str> {
    self.steps.iter().map(|s| s.name.as_str())
  }

  pub(crate) fn step_mut(&mut self, step_name: &str) -> FlowResult<&mut StepDef<TData, Err>> {
    self
      .steps
      .iter_mut()
      .find(|s| s.name == step_name)
      .ok_or_else(|| FlowError::StepNotFound {
        step_name: step_name.to_string(),
      })
  }
}

impl<TData, Err> std::fmt::Debug for Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pipeline")
      .field("context", &std::any::type_name::<TData>())
      .field("steps", &self.steps)
      .finish()
  }
}
