// clinic_flow/src/core/step.rs

//! A named step and the handlers attached to it.

use super::Handler;

/// Handler slot within a step. A step runs all `Before` handlers, then `On`,
/// then `After`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
  Before,
  On,
  After,
}

impl Phase {
  pub const ALL: [Phase; 3] = [Phase::Before, Phase::On, Phase::After];

  pub fn as_str(self) -> &'static str {
    match self {
      Phase::Before => "before",
      Phase::On => "on",
      Phase::After => "after",
    }
  }
}

pub struct StepDef<TData: 'static + Send + Sync, Err> {
  pub name: String,
  before: Vec<Handler<TData, Err>>,
  on: Vec<Handler<TData, Err>>,
  after: Vec<Handler<TData, Err>>,
}

impl<TData: 'static + Send + Sync, Err> StepDef<TData, Err> {
  pub(crate) fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      before: Vec::new(),
      on: Vec::new(),
      after: Vec::new(),
    }
  }

  pub fn handlers(&self, phase: Phase) -> &[Handler<TData, Err>] {
    match phase {
      Phase::Before => &self.before,
      Phase::On => &self.on,
      Phase::After => &self.after,
    }
  }

  pub(crate) fn push(&mut self, phase: Phase, handler: Handler<TData, Err>) {
    match phase {
      Phase::Before => self.before.push(handler),
      Phase::On => self.on.push(handler),
      Phase::After => self.after.push(handler),
    }
  }

  pub fn has_handlers(&self) -> bool {
    !(self.before.is_empty() && self.on.is_empty() && self.after.is_empty())
  }
}

// Handlers are opaque closures; report how many are attached instead.
impl<TData: 'static + Send + Sync, Err> std::fmt::Debug for StepDef<TData, Err> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("before", &self.before.len())
      .field("on", &self.on.len())
      .field("after", &self.after.len())
      .finish()
  }
}
