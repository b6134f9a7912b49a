use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use lupine_engine::{EngineInvoker, ExecutionStatus};
use lupine_file::{FileStore, SaveFile};
use lupine_flow::{FlowRunStatus, FlowVersion, FlowVersionState, RunJob};
use lupine_sandbox::{Sandbox, SandboxPool};
use lupine_store::{FlowRunStore, FlowVersionStore};
use tracing::{error, info, instrument};

use crate::artifacts::ArtifactBuilder;
use crate::capture::ErrorCapture;
use crate::code::CodeBuilder;
use crate::error::WorkerError;
use crate::input::load_input;
use crate::lock::LockService;
use crate::pieces::PieceInstaller;
use crate::prepare::SandboxPreparer;

/// The collaborators a worker drives, injected at construction.
pub struct WorkerServices {
  pub pool: SandboxPool,
  pub versions: Arc<dyn FlowVersionStore>,
  pub runs: Arc<dyn FlowRunStore>,
  pub files: Arc<dyn FileStore>,
  pub engine: Arc<dyn EngineInvoker>,
  pub pieces: Arc<dyn PieceInstaller>,
  pub code_builder: Arc<dyn CodeBuilder>,
  pub locks: Arc<dyn LockService>,
  pub capture: Arc<dyn ErrorCapture>,
}

/// The flow-run worker: executes one job end to end.
pub struct FlowWorker {
  pool: SandboxPool,
  versions: Arc<dyn FlowVersionStore>,
  runs: Arc<dyn FlowRunStore>,
  files: Arc<dyn FileStore>,
  engine: Arc<dyn EngineInvoker>,
  pieces: Arc<dyn PieceInstaller>,
  capture: Arc<dyn ErrorCapture>,
  preparer: SandboxPreparer,
}

impl FlowWorker {
  pub fn new(services: WorkerServices) -> Self {
    let artifacts = ArtifactBuilder::new(
      Arc::clone(&services.files),
      services.code_builder,
      Arc::clone(&services.versions),
    );
    let preparer = SandboxPreparer::new(services.locks, Arc::clone(&services.versions), artifacts);

    Self {
      pool: services.pool,
      versions: services.versions,
      runs: services.runs,
      files: services.files,
      engine: services.engine,
      pieces: services.pieces,
      capture: services.capture,
      preparer,
    }
  }

  /// Execute one job to completion or suspension.
  ///
  /// The run's terminal status is the externally observed outcome; the
  /// returned error only reports infrastructure failures that happened
  /// before a sandbox was obtained or while finalizing the run.
  #[instrument(name = "flow_run", skip_all, fields(run_id = %job.run_id))]
  pub async fn execute(&self, job: RunJob) -> Result<(), WorkerError> {
    let started = Instant::now();
    info!(
      flow_version_id = %job.flow_version_id,
      execution_type = ?job.execution_type,
      "flow_run_started"
    );

    let version = self.versions.get_one(&job.flow_version_id).await?;
    let key = sandbox_key(&version);
    let sandbox = self.pool.checkout(&key).await?;
    info!(
      sandbox_id = sandbox.id(),
      version_id = %version.id,
      cached = sandbox.cached(),
      "sandbox_obtained"
    );

    // The checkout handle releases the sandbox on drop, so every branch
    // below returns it exactly once.
    let result = self.run_in_sandbox(&job, &version, &sandbox).await;

    match result {
      Ok(status) => {
        info!(
          status = %status,
          duration_ms = started.elapsed().as_millis() as u64,
          "flow_run_finished"
        );
        Ok(())
      }
      Err(WorkerError::ExecutionTimeout) => {
        self
          .runs
          .finish(&job.run_id, FlowRunStatus::Timeout, None)
          .await?;
        Ok(())
      }
      Err(err) => {
        error!(error = %err, "flow_run_failed");
        self.capture.capture(&err);
        self
          .runs
          .finish(&job.run_id, FlowRunStatus::InternalError, None)
          .await?;
        Ok(())
      }
    }
  }

  async fn run_in_sandbox(
    &self,
    job: &RunJob,
    version: &FlowVersion,
    sandbox: &Sandbox,
  ) -> Result<FlowRunStatus, WorkerError> {
    let started = Instant::now();

    if !sandbox.cached() {
      sandbox.recreate().await?;
      let prepared = self
        .preparer
        .prepare(sandbox, &version.id, &job.project_id)
        .await?;
      self
        .pieces
        .install(sandbox.root(), &prepared.pieces())
        .await?;
      info!(
        sandbox_id = sandbox.id(),
        duration_ms = started.elapsed().as_millis() as u64,
        "sandbox_prepared"
      );
    } else {
      sandbox.reset().await?;
      info!(
        sandbox_id = sandbox.id(),
        duration_ms = started.elapsed().as_millis() as u64,
        "sandbox_reused"
      );
    }

    let input = load_input(job, self.runs.as_ref(), self.files.as_ref()).await?;
    let output = self.engine.execute(sandbox, &input.operation).await?;

    let log_file = self
      .files
      .save(SaveFile {
        file_id: input.log_file_id,
        project_id: job.project_id.clone(),
        data: Bytes::from(serde_json::to_vec(&output)?),
      })
      .await?;

    match output.status {
      ExecutionStatus::Paused => {
        let pause_metadata = output
          .pause_metadata
          .clone()
          .ok_or_else(|| WorkerError::Validation {
            message: format!("engine paused run '{}' without pause metadata", job.run_id),
          })?;
        self
          .runs
          .pause(&job.run_id, &log_file.id, pause_metadata)
          .await?;
      }
      status => {
        self
          .runs
          .finish(&job.run_id, status.into(), Some(log_file.id))
          .await?;
      }
    }

    Ok(output.status.into())
  }
}

/// The pool key for a version's sandbox.
///
/// Non-draft versions are immutable, so their id alone identifies the
/// sandbox contents. Draft versions get a disposable key per execution so
/// they never share or pollute a cached sandbox.
fn sandbox_key(version: &FlowVersion) -> String {
  match version.state {
    FlowVersionState::Draft => format!("{}-draft-{}", version.id, uuid::Uuid::new_v4()),
    FlowVersionState::Locked => version.id.clone(),
  }
}

#[cfg(test)]
mod tests {
  use lupine_flow::{Trigger, TriggerKind};

  use super::*;

  fn version(state: FlowVersionState) -> FlowVersion {
    FlowVersion {
      id: "version-1".to_string(),
      flow_id: "flow-1".to_string(),
      display_name: "test".to_string(),
      state,
      trigger: Trigger {
        name: "trigger".to_string(),
        display_name: "Trigger".to_string(),
        kind: TriggerKind::Empty,
        next_action: None,
      },
    }
  }

  #[test]
  fn locked_versions_share_one_key() {
    let locked = version(FlowVersionState::Locked);
    assert_eq!(sandbox_key(&locked), sandbox_key(&locked));
    assert_eq!(sandbox_key(&locked), "version-1");
  }

  #[test]
  fn draft_versions_get_disposable_keys() {
    let draft = version(FlowVersionState::Draft);
    let first = sandbox_key(&draft);
    let second = sandbox_key(&draft);
    assert_ne!(first, second);
    assert!(first.starts_with("version-1-draft-"));
  }
}
