//! Lupine Engine
//!
//! This crate provides the seam between the worker and the external flow
//! engine: the structured operation handed to the engine, the structured
//! trace it returns, and the [`EngineInvoker`] trait. The engine's per-step
//! interpreter is not part of this crate.
//!
//! [`ProcessEngineInvoker`] runs an engine executable against a prepared
//! sandbox with a wall-clock bound; an elapsed bound surfaces as the
//! distinguished [`EngineError::Timeout`].

mod operation;
mod process;

pub use operation::{ExecuteFlowOperation, ExecutionOutput, ExecutionStatus, TriggerPayload};
pub use process::ProcessEngineInvoker;

use async_trait::async_trait;
use lupine_sandbox::Sandbox;

/// Error type for engine invocations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// The engine exceeded its execution time bound.
  #[error("engine execution timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  /// The engine process could not be spawned or awaited.
  #[error("failed to run engine process")]
  Process {
    #[source]
    source: std::io::Error,
  },

  /// The engine exited unsuccessfully.
  #[error("engine exited with failure: {message}")]
  Failed { message: String },

  /// The engine produced no readable execution output.
  #[error("invalid engine output: {message}")]
  InvalidOutput { message: String },
}

/// Executes a fully prepared sandbox against a structured operation.
#[async_trait]
pub trait EngineInvoker: Send + Sync {
  /// Run one flow execution and return its trace.
  async fn execute(
    &self,
    sandbox: &Sandbox,
    operation: &ExecuteFlowOperation,
  ) -> Result<ExecutionOutput, EngineError>;
}
