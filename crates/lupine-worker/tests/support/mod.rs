//! Shared fixtures and scripted collaborators for worker tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use lupine_engine::{EngineError, EngineInvoker, ExecuteFlowOperation, ExecutionOutput, ExecutionStatus};
use lupine_file::{FileStore, MemFileStore, SaveFile};
use lupine_flow::{
  Action, ActionKind, CodeSettings, ExecutionType, FlowRun, FlowRunStatus, FlowVersion,
  FlowVersionState, PauseMetadata, PiecePackage, PieceSettings, RunJob, Trigger, TriggerKind,
};
use lupine_sandbox::{Sandbox, SandboxPool};
use lupine_store::{MemFlowRunStore, MemFlowVersionStore};
use lupine_worker::{
  BuildError, CodeBuilder, ErrorCapture, FlowWorker, InstallError, LocalLockService,
  PieceInstaller, WorkerError, WorkerServices,
};

pub const PROJECT_ID: &str = "project";
pub const VERSION_ID: &str = "version-1";

/// Engine double that replays a queue of results and counts calls.
/// An exhausted queue yields a succeeded output.
pub struct ScriptedEngine {
  script: Mutex<VecDeque<Result<ExecutionOutput, EngineError>>>,
  calls: AtomicUsize,
}

impl ScriptedEngine {
  pub fn new(script: Vec<Result<ExecutionOutput, EngineError>>) -> Self {
    Self {
      script: Mutex::new(script.into()),
      calls: AtomicUsize::new(0),
    }
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl EngineInvoker for ScriptedEngine {
  async fn execute(
    &self,
    _sandbox: &Sandbox,
    _operation: &ExecuteFlowOperation,
  ) -> Result<ExecutionOutput, EngineError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let mut script = self.script.lock().expect("script lock");
    script.pop_front().unwrap_or_else(|| Ok(succeeded_output()))
  }
}

/// Code builder double that counts builds.
#[derive(Default)]
pub struct CountingCodeBuilder {
  builds: AtomicUsize,
}

impl CountingCodeBuilder {
  pub fn builds(&self) -> usize {
    self.builds.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl CodeBuilder for CountingCodeBuilder {
  async fn build(&self, source: Bytes) -> Result<Bytes, BuildError> {
    self.builds.fetch_add(1, Ordering::SeqCst);
    let mut bundle = b"bundled:".to_vec();
    bundle.extend_from_slice(&source);
    Ok(Bytes::from(bundle))
  }
}

/// Piece installer double that records every install call.
#[derive(Default)]
pub struct RecordingInstaller {
  installs: Mutex<Vec<Vec<PiecePackage>>>,
}

impl RecordingInstaller {
  pub fn install_count(&self) -> usize {
    self.installs.lock().expect("installs lock").len()
  }

  pub fn installed_pieces(&self) -> Vec<Vec<PiecePackage>> {
    self.installs.lock().expect("installs lock").clone()
  }
}

#[async_trait]
impl PieceInstaller for RecordingInstaller {
  async fn install(
    &self,
    _target: &std::path::Path,
    pieces: &[PiecePackage],
  ) -> Result<(), InstallError> {
    self
      .installs
      .lock()
      .expect("installs lock")
      .push(pieces.to_vec());
    Ok(())
  }
}

/// Error-capture double that counts reports.
#[derive(Default)]
pub struct CountingCapture {
  captured: AtomicUsize,
}

impl CountingCapture {
  pub fn captured(&self) -> usize {
    self.captured.load(Ordering::SeqCst)
  }
}

impl ErrorCapture for CountingCapture {
  fn capture(&self, _error: &WorkerError) {
    self.captured.fetch_add(1, Ordering::SeqCst);
  }
}

/// Fully wired worker with inspectable collaborators.
pub struct Harness {
  pub worker: Arc<FlowWorker>,
  pub pool: SandboxPool,
  pub pool_root: PathBuf,
  pub capacity: usize,
  pub versions: Arc<MemFlowVersionStore>,
  pub runs: Arc<MemFlowRunStore>,
  pub files: Arc<MemFileStore>,
  pub engine: Arc<ScriptedEngine>,
  pub installer: Arc<RecordingInstaller>,
  pub code_builder: Arc<CountingCodeBuilder>,
  pub capture: Arc<CountingCapture>,
  _dir: tempfile::TempDir,
}

impl Harness {
  pub fn new(engine_script: Vec<Result<ExecutionOutput, EngineError>>) -> Self {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool_root = dir.path().join("sandboxes");
    let capacity = 4;
    let pool = SandboxPool::new(&pool_root, capacity);

    let versions = Arc::new(MemFlowVersionStore::new());
    let runs = Arc::new(MemFlowRunStore::new());
    let files = Arc::new(MemFileStore::new());
    let engine = Arc::new(ScriptedEngine::new(engine_script));
    let installer = Arc::new(RecordingInstaller::default());
    let code_builder = Arc::new(CountingCodeBuilder::default());
    let capture = Arc::new(CountingCapture::default());

    let worker = FlowWorker::new(WorkerServices {
      pool: pool.clone(),
      versions: versions.clone(),
      runs: runs.clone(),
      files: files.clone(),
      engine: engine.clone(),
      pieces: installer.clone(),
      code_builder: code_builder.clone(),
      locks: Arc::new(LocalLockService::new()),
      capture: capture.clone(),
    });

    Self {
      worker: Arc::new(worker),
      pool,
      pool_root,
      capacity,
      versions,
      runs,
      files,
      engine,
      installer,
      code_builder,
      capture,
      _dir: dir,
    }
  }

  pub fn seed_version(&self, version: FlowVersion) {
    self.versions.insert(version);
  }

  pub fn seed_run(&self, run: FlowRun) {
    self.runs.insert(run);
  }

  pub async fn seed_file(&self, file_id: &str, data: &[u8]) {
    self
      .files
      .save(SaveFile {
        file_id: Some(file_id.to_string()),
        project_id: PROJECT_ID.to_string(),
        data: Bytes::copy_from_slice(data),
      })
      .await
      .expect("seed file");
  }

  /// All sandboxes must be back in the pool once a job completes.
  pub fn assert_pool_drained(&self) {
    assert_eq!(self.pool.available(), self.capacity);
  }
}

pub fn succeeded_output() -> ExecutionOutput {
  ExecutionOutput {
    status: ExecutionStatus::Succeeded,
    execution_state: serde_json::json!({"steps": {}}),
    pause_metadata: None,
  }
}

pub fn output_with_status(status: ExecutionStatus) -> ExecutionOutput {
  ExecutionOutput {
    status,
    execution_state: serde_json::json!({"steps": {}}),
    pause_metadata: None,
  }
}

pub fn paused_output() -> ExecutionOutput {
  ExecutionOutput {
    status: ExecutionStatus::Paused,
    execution_state: serde_json::json!({"steps": {"wait": "pending"}}),
    pause_metadata: Some(PauseMetadata {
      resume_step_metadata: serde_json::json!({"step": "wait"}),
    }),
  }
}

pub fn piece_trigger() -> Trigger {
  Trigger {
    name: "trigger".to_string(),
    display_name: "Trigger".to_string(),
    kind: TriggerKind::Piece {
      settings: PieceSettings {
        piece_name: "lupine/schedule".to_string(),
        piece_version: "0.1.0".to_string(),
        input: serde_json::Value::Null,
      },
    },
    next_action: None,
  }
}

pub fn code_action(name: &str, settings: CodeSettings) -> Action {
  Action {
    name: name.to_string(),
    display_name: name.to_string(),
    kind: ActionKind::Code { settings },
    next_action: None,
  }
}

pub fn version_without_code(state: FlowVersionState) -> FlowVersion {
  FlowVersion {
    id: VERSION_ID.to_string(),
    flow_id: "flow-1".to_string(),
    display_name: "test flow".to_string(),
    state,
    trigger: piece_trigger(),
  }
}

pub fn version_with_code(state: FlowVersionState, settings: CodeSettings) -> FlowVersion {
  let mut version = version_without_code(state);
  version.trigger.next_action = Some(Box::new(code_action("run-code", settings)));
  version
}

pub fn begin_job(run_id: &str) -> RunJob {
  RunJob {
    run_id: run_id.to_string(),
    flow_version_id: VERSION_ID.to_string(),
    project_id: PROJECT_ID.to_string(),
    execution_type: ExecutionType::Begin,
    payload: serde_json::json!({"body": "hello"}),
  }
}

pub fn resume_job(run_id: &str) -> RunJob {
  RunJob {
    execution_type: ExecutionType::Resume,
    ..begin_job(run_id)
  }
}

pub fn running_run(run_id: &str) -> FlowRun {
  FlowRun {
    id: run_id.to_string(),
    project_id: PROJECT_ID.to_string(),
    flow_version_id: VERSION_ID.to_string(),
    status: FlowRunStatus::Running,
    pause_metadata: None,
    logs_file_id: None,
  }
}
