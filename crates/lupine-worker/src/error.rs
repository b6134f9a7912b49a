use lupine_engine::EngineError;
use lupine_file::FileError;
use lupine_sandbox::SandboxError;
use lupine_store::StoreError;

use crate::code::BuildError;
use crate::lock::LockError;
use crate::pieces::InstallError;

/// The closed error taxonomy of one worker job.
///
/// The orchestrator's outer handler pattern-matches on these variants to pick
/// the run's terminal status: `ExecutionTimeout` finishes the run as
/// `Timeout` without telemetry, everything else finishes it as
/// `InternalError` with one error-capture call. `NotFound` conditions arrive
/// through the wrapped store/file errors and are never recovered.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
  /// A data-integrity violation, e.g. a code step without a source artifact
  /// or a resume without pause metadata. Not retryable.
  #[error("validation failed: {message}")]
  Validation { message: String },

  /// The preparation lock for a flow version could not be acquired in time.
  #[error("timed out acquiring preparation lock '{key}' after {timeout_ms}ms")]
  LockTimeout { key: String, timeout_ms: u64 },

  /// The engine reported that the execution exceeded its time bound.
  #[error("flow execution timed out")]
  ExecutionTimeout,

  /// The engine failed for a reason other than a timeout.
  #[error("engine invocation failed")]
  Engine(#[source] EngineError),

  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  File(#[from] FileError),

  #[error(transparent)]
  Sandbox(#[from] SandboxError),

  #[error(transparent)]
  Install(#[from] InstallError),

  #[error(transparent)]
  Build(#[from] BuildError),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("serialization error: {0}")]
  Serde(#[from] serde_json::Error),
}

impl From<EngineError> for WorkerError {
  fn from(error: EngineError) -> Self {
    match error {
      EngineError::Timeout { .. } => WorkerError::ExecutionTimeout,
      other => WorkerError::Engine(other),
    }
  }
}

impl From<LockError> for WorkerError {
  fn from(error: LockError) -> Self {
    match error {
      LockError::Timeout { key, timeout_ms } => WorkerError::LockTimeout { key, timeout_ms },
    }
  }
}
