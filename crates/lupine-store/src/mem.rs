use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use lupine_flow::{FlowRun, FlowRunStatus, FlowVersion, PauseMetadata};

use crate::{FlowRunStore, FlowVersionStore, StoreError};

/// In-memory flow version store.
#[derive(Default)]
pub struct MemFlowVersionStore {
  versions: RwLock<HashMap<String, FlowVersion>>,
}

impl MemFlowVersionStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seed a version, e.g. when loading a definition from disk.
  pub fn insert(&self, version: FlowVersion) {
    let mut versions = self.versions.write().unwrap_or_else(|e| e.into_inner());
    versions.insert(version.id.clone(), version);
  }
}

#[async_trait]
impl FlowVersionStore for MemFlowVersionStore {
  async fn get_one(&self, version_id: &str) -> Result<FlowVersion, StoreError> {
    let versions = self.versions.read().unwrap_or_else(|e| e.into_inner());
    versions
      .get(version_id)
      .cloned()
      .ok_or_else(|| StoreError::VersionNotFound {
        version_id: version_id.to_string(),
      })
  }

  async fn overwrite(&self, version: FlowVersion) -> Result<(), StoreError> {
    let mut versions = self.versions.write().unwrap_or_else(|e| e.into_inner());
    versions.insert(version.id.clone(), version);
    Ok(())
  }
}

/// In-memory flow run store.
#[derive(Default)]
pub struct MemFlowRunStore {
  runs: RwLock<HashMap<String, FlowRun>>,
}

impl MemFlowRunStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seed a run, e.g. when enqueuing a job outside a real API layer.
  pub fn insert(&self, run: FlowRun) {
    let mut runs = self.runs.write().unwrap_or_else(|e| e.into_inner());
    runs.insert(run.id.clone(), run);
  }
}

#[async_trait]
impl FlowRunStore for MemFlowRunStore {
  async fn get_one(&self, run_id: &str, project_id: &str) -> Result<FlowRun, StoreError> {
    let runs = self.runs.read().unwrap_or_else(|e| e.into_inner());
    runs
      .get(run_id)
      .filter(|run| run.project_id == project_id)
      .cloned()
      .ok_or_else(|| StoreError::RunNotFound {
        run_id: run_id.to_string(),
      })
  }

  async fn pause(
    &self,
    run_id: &str,
    log_file_id: &str,
    pause_metadata: PauseMetadata,
  ) -> Result<(), StoreError> {
    let mut runs = self.runs.write().unwrap_or_else(|e| e.into_inner());
    let run = runs.get_mut(run_id).ok_or_else(|| StoreError::RunNotFound {
      run_id: run_id.to_string(),
    })?;

    run.status = FlowRunStatus::Paused;
    run.logs_file_id = Some(log_file_id.to_string());
    run.pause_metadata = Some(pause_metadata);
    Ok(())
  }

  async fn finish(
    &self,
    run_id: &str,
    status: FlowRunStatus,
    log_file_id: Option<String>,
  ) -> Result<(), StoreError> {
    let mut runs = self.runs.write().unwrap_or_else(|e| e.into_inner());
    let run = runs.get_mut(run_id).ok_or_else(|| StoreError::RunNotFound {
      run_id: run_id.to_string(),
    })?;

    run.status = status;
    run.logs_file_id = log_file_id;
    run.pause_metadata = None;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run(id: &str, project_id: &str) -> FlowRun {
    FlowRun {
      id: id.to_string(),
      project_id: project_id.to_string(),
      flow_version_id: "version-1".to_string(),
      status: FlowRunStatus::Running,
      pause_metadata: None,
      logs_file_id: None,
    }
  }

  #[tokio::test]
  async fn pause_then_finish_transitions() {
    let store = MemFlowRunStore::new();
    store.insert(run("run-1", "project"));

    store
      .pause(
        "run-1",
        "log-1",
        PauseMetadata {
          resume_step_metadata: serde_json::json!({"step": "wait"}),
        },
      )
      .await
      .expect("pause");

    let paused = store.get_one("run-1", "project").await.expect("get");
    assert_eq!(paused.status, FlowRunStatus::Paused);
    assert_eq!(paused.logs_file_id.as_deref(), Some("log-1"));
    assert!(paused.pause_metadata.is_some());

    store
      .finish("run-1", FlowRunStatus::Succeeded, Some("log-1".to_string()))
      .await
      .expect("finish");

    let finished = store.get_one("run-1", "project").await.expect("get");
    assert_eq!(finished.status, FlowRunStatus::Succeeded);
    assert!(finished.pause_metadata.is_none());
  }

  #[tokio::test]
  async fn get_one_is_project_scoped() {
    let store = MemFlowRunStore::new();
    store.insert(run("run-1", "project-a"));

    assert!(matches!(
      store.get_one("run-1", "project-b").await,
      Err(StoreError::RunNotFound { .. })
    ));
  }
}
