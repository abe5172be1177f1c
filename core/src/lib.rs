// clinic_flow/src/lib.rs

//! clinic_flow: small async step pipelines for the clinic shop.
//!
//! A pipeline is an ordered list of named steps. Each step carries handlers in
//! three phases (`Before`, `On`, `After`). Handlers receive the shared
//! [`ContextData`] of the run, may read and mutate it, and return a
//! [`PipelineControl`] telling the runner to continue or stop.
//!
//! ```text
//!   1. Define the data a workflow threads through its steps (`CheckoutCtxData`).
//!   2. Build a `Pipeline<CheckoutCtxData, AppError>` from step names.
//!   3. Attach async handlers with `.before()`, `.on()`, `.after()`.
//!   4. Register the pipeline in a `FlowRegistry<AppError>`.
//!   5. Wrap the initial data in `ContextData::new(..)` and call `registry.run(ctx)`.
//! ```

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{Phase, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::FlowRegistry;
