// clinic_flow/src/pipeline/execution.rs

//! `Pipeline::run`.

use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::core::step::Phase;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes every step in order against `ctx_data`.
  ///
  /// Returns `Stopped` as soon as a handler asks to stop, and the handler's
  /// error as soon as one fails; nothing after that point runs. A step with no
  /// handlers in any phase is a configuration error, reported as
  /// `FlowError::HandlerMissing` before the first handler executes.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    if let Some(step) = self.steps.iter().find(|s| !s.has_handlers()) {
      event!(Level::ERROR, step = %step.name, "Step has no handlers.");
      return Err(Err::from(FlowError::HandlerMissing {
        step_name: step.name.clone(),
      }));
    }

    for (step_idx, step) in self.steps.iter().enumerate() {
      let step_span = span!(Level::INFO, "pipeline_step", step = %step.name, step_index = step_idx);

      for phase in Phase::ALL {
        for (handler_idx, handler_fn) in step.handlers(phase).iter().enumerate() {
          let handler_span = span!(
            parent: &step_span,
            Level::DEBUG,
            "step_handler",
            phase = phase.as_str(),
            handler_index = handler_idx
          );
          match handler_fn(ctx_data.clone()).instrument(handler_span).await {
            Ok(PipelineControl::Continue) => {}
            Ok(PipelineControl::Stop) => {
              event!(Level::INFO, step = %step.name, phase = phase.as_str(), "Pipeline stopped by handler.");
              return Ok(PipelineResult::Stopped);
            }
            Err(e) => {
              event!(Level::WARN, step = %step.name, phase = phase.as_str(), error = %e, "Handler failed.");
              return Err(e);
            }
          }
        }
      }
      event!(Level::DEBUG, step = %step.name, "Step finished.");
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }
}
