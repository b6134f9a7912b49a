//! Lupine Store
//!
//! This crate provides the persistence traits for flow versions and flow
//! runs, plus in-memory implementations for tests and single-process wiring.
//!
//! The run store exposes exactly two mutations, `pause` and `finish`. Those
//! are the only lifecycle transitions a worker is allowed to make.

mod mem;

pub use mem::{MemFlowRunStore, MemFlowVersionStore};

use async_trait::async_trait;
use lupine_flow::{FlowRun, FlowRunStatus, FlowVersion, PauseMetadata};

/// Error type for store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested flow version was not found.
  #[error("flow version not found: {version_id}")]
  VersionNotFound { version_id: String },

  /// The requested flow run was not found.
  #[error("flow run not found: {run_id}")]
  RunNotFound { run_id: String },
}

/// Persistence for flow versions.
#[async_trait]
pub trait FlowVersionStore: Send + Sync {
  /// Retrieve a version by id.
  async fn get_one(&self, version_id: &str) -> Result<FlowVersion, StoreError>;

  /// Overwrite a version in place, keyed by its id.
  ///
  /// Used to persist the artifact cache after code steps were built, so
  /// future preparations skip the rebuild.
  async fn overwrite(&self, version: FlowVersion) -> Result<(), StoreError>;
}

/// Persistence for flow runs.
#[async_trait]
pub trait FlowRunStore: Send + Sync {
  /// Retrieve a run by id, scoped to a project.
  async fn get_one(&self, run_id: &str, project_id: &str) -> Result<FlowRun, StoreError>;

  /// Suspend a run: record the log file and the continuation point.
  async fn pause(
    &self,
    run_id: &str,
    log_file_id: &str,
    pause_metadata: PauseMetadata,
  ) -> Result<(), StoreError>;

  /// Finish a run with a terminal status and an optional log file.
  async fn finish(
    &self,
    run_id: &str,
    status: FlowRunStatus,
    log_file_id: Option<String>,
  ) -> Result<(), StoreError>;
}
