use serde::{Deserialize, Serialize};

/// One queued execution request, consumed from the scheduling layer.
///
/// The wire schema is fixed by the queue producer, hence the SCREAMING
/// execution-type tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunJob {
  pub run_id: String,
  pub flow_version_id: String,
  pub project_id: String,
  pub execution_type: ExecutionType,
  #[serde(default)]
  pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
  /// First execution of the run.
  Begin,
  /// Continuation of a previously paused run.
  Resume,
}
