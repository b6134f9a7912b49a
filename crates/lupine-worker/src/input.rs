use lupine_engine::{ExecuteFlowOperation, ExecutionOutput, TriggerPayload};
use lupine_file::FileStore;
use lupine_flow::{ExecutionType, RunJob};
use lupine_store::FlowRunStore;

use crate::error::WorkerError;

/// The operation to hand to the engine, plus the log file id to reuse when
/// persisting the trace (resume only; first executions allocate a new id).
pub(crate) struct LoadedInput {
  pub operation: ExecuteFlowOperation,
  pub log_file_id: Option<String>,
}

/// Build the engine operation for one job, branching on its execution type.
pub(crate) async fn load_input(
  job: &RunJob,
  runs: &dyn FlowRunStore,
  files: &dyn FileStore,
) -> Result<LoadedInput, WorkerError> {
  let trigger_payload = TriggerPayload::from_job_payload(job.payload.clone());

  match job.execution_type {
    ExecutionType::Begin => Ok(LoadedInput {
      operation: ExecuteFlowOperation::Begin {
        flow_version_id: job.flow_version_id.clone(),
        project_id: job.project_id.clone(),
        trigger_payload,
      },
      log_file_id: None,
    }),

    ExecutionType::Resume => {
      let run = runs.get_one(&job.run_id, &job.project_id).await?;

      // Both fields are written together by `pause`; a half-present pair is
      // corrupt data, not a retryable condition.
      let (pause_metadata, logs_file_id) = match (run.pause_metadata, run.logs_file_id) {
        (Some(metadata), Some(file_id)) => (metadata, file_id),
        _ => {
          return Err(WorkerError::Validation {
            message: format!(
              "run '{}' cannot resume without pause metadata and a logs file",
              run.id
            ),
          });
        }
      };

      let log_file = files.get_one(&job.project_id, &logs_file_id).await?;
      let prior: ExecutionOutput = serde_json::from_slice(&log_file.data)?;

      Ok(LoadedInput {
        operation: ExecuteFlowOperation::Resume {
          flow_version_id: job.flow_version_id.clone(),
          project_id: job.project_id.clone(),
          trigger_payload,
          execution_state: prior.execution_state,
          resume_step_metadata: pause_metadata.resume_step_metadata,
        },
        log_file_id: Some(log_file.id),
      })
    }
  }
}
