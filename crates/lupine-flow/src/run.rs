use serde::{Deserialize, Serialize};

/// A persisted flow run.
///
/// Mutated only through the run store's `pause` and `finish` transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRun {
  pub id: String,
  pub project_id: String,
  pub flow_version_id: String,
  pub status: FlowRunStatus,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pause_metadata: Option<PauseMetadata>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub logs_file_id: Option<String>,
}

/// Lifecycle status of a flow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowRunStatus {
  Running,
  Succeeded,
  Failed,
  Paused,
  Timeout,
  InternalError,
}

impl FlowRunStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      FlowRunStatus::Running => "running",
      FlowRunStatus::Succeeded => "succeeded",
      FlowRunStatus::Failed => "failed",
      FlowRunStatus::Paused => "paused",
      FlowRunStatus::Timeout => "timeout",
      FlowRunStatus::InternalError => "internal_error",
    }
  }
}

impl std::fmt::Display for FlowRunStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The saved continuation point of a paused run.
///
/// `resume_step_metadata` is opaque to the worker; it is produced by the
/// engine when a run pauses and handed back on resume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauseMetadata {
  pub resume_step_metadata: serde_json::Value,
}
