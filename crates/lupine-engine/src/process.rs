use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use lupine_sandbox::Sandbox;
use tokio::fs;
use tokio::process::Command;
use tracing::debug;

use crate::{EngineError, EngineInvoker, ExecuteFlowOperation, ExecutionOutput};

const OPERATION_FILE: &str = "operation.json";
const OUTPUT_FILE: &str = "output.json";

/// Runs an engine executable against a prepared sandbox.
///
/// Protocol: the operation is written to `scratch/operation.json`, the engine
/// binary is invoked with the sandbox root as its single argument, and the
/// trace is read back from `scratch/output.json`. The process is killed if it
/// outlives the configured bound.
pub struct ProcessEngineInvoker {
  engine_bin: PathBuf,
  timeout: Duration,
}

impl ProcessEngineInvoker {
  pub fn new(engine_bin: impl Into<PathBuf>, timeout: Duration) -> Self {
    Self {
      engine_bin: engine_bin.into(),
      timeout,
    }
  }
}

#[async_trait]
impl EngineInvoker for ProcessEngineInvoker {
  async fn execute(
    &self,
    sandbox: &Sandbox,
    operation: &ExecuteFlowOperation,
  ) -> Result<ExecutionOutput, EngineError> {
    let scratch = sandbox.scratch_dir();
    let operation_json =
      serde_json::to_vec(operation).map_err(|e| EngineError::InvalidOutput {
        message: format!("failed to serialize operation: {e}"),
      })?;
    fs::write(scratch.join(OPERATION_FILE), operation_json)
      .await
      .map_err(|source| EngineError::Process { source })?;

    debug!(
      engine_bin = %self.engine_bin.display(),
      sandbox_root = %sandbox.root().display(),
      "engine_process_spawned"
    );

    let mut command = Command::new(&self.engine_bin);
    command.arg(sandbox.root()).kill_on_drop(true);

    let output = match tokio::time::timeout(self.timeout, command.output()).await {
      Ok(Ok(output)) => output,
      Ok(Err(source)) => return Err(EngineError::Process { source }),
      Err(_) => {
        return Err(EngineError::Timeout {
          timeout_ms: self.timeout.as_millis() as u64,
        });
      }
    };

    if !output.status.success() {
      return Err(EngineError::Failed {
        message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    let trace = fs::read(scratch.join(OUTPUT_FILE))
      .await
      .map_err(|e| EngineError::InvalidOutput {
        message: format!("missing engine output file: {e}"),
      })?;

    serde_json::from_slice(&trace).map_err(|e| EngineError::InvalidOutput {
      message: format!("failed to parse engine output: {e}"),
    })
  }
}
