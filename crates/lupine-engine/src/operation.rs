use lupine_flow::{FlowRunStatus, PauseMetadata};
use serde::{Deserialize, Serialize};

/// The structured operation handed to the engine for one execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "execution_type", rename_all = "snake_case")]
pub enum ExecuteFlowOperation {
  /// First execution: start from the trigger payload.
  Begin {
    flow_version_id: String,
    project_id: String,
    trigger_payload: TriggerPayload,
  },
  /// Continuation: pick up from the saved execution state.
  Resume {
    flow_version_id: String,
    project_id: String,
    trigger_payload: TriggerPayload,
    execution_state: serde_json::Value,
    resume_step_metadata: serde_json::Value,
  },
}

/// Synthetic trigger-step output wrapping the job's raw payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerPayload {
  pub status: ExecutionStatus,
  pub duration_ms: u64,
  pub input: serde_json::Value,
  pub output: serde_json::Value,
}

impl TriggerPayload {
  /// The payload for a fresh execution: succeeded, zero duration, empty
  /// input, output set to the job's raw payload.
  pub fn from_job_payload(payload: serde_json::Value) -> Self {
    Self {
      status: ExecutionStatus::Succeeded,
      duration_ms: 0,
      input: serde_json::Value::Object(serde_json::Map::new()),
      output: payload,
    }
  }
}

/// The execution trace returned by the engine. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOutput {
  pub status: ExecutionStatus,
  pub execution_state: serde_json::Value,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pause_metadata: Option<PauseMetadata>,
}

/// Terminal status of one engine execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
  Succeeded,
  Failed,
  Paused,
  Timeout,
  InternalError,
}

impl From<ExecutionStatus> for FlowRunStatus {
  fn from(status: ExecutionStatus) -> Self {
    match status {
      ExecutionStatus::Succeeded => FlowRunStatus::Succeeded,
      ExecutionStatus::Failed => FlowRunStatus::Failed,
      ExecutionStatus::Paused => FlowRunStatus::Paused,
      ExecutionStatus::Timeout => FlowRunStatus::Timeout,
      ExecutionStatus::InternalError => FlowRunStatus::InternalError,
    }
  }
}
