use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lupine_engine::ProcessEngineInvoker;
use lupine_file::FsFileStore;
use lupine_flow::{FlowRun, FlowRunStatus, FlowVersion, RunJob};
use lupine_sandbox::SandboxPool;
use lupine_store::{FlowRunStore, MemFlowRunStore, MemFlowVersionStore};
use lupine_worker::{
  FlowWorker, FsPieceInstaller, LocalLockService, PassthroughCodeBuilder, TracingErrorCapture,
  WorkerServices,
};

const SANDBOX_POOL_SIZE: usize = 4;
const ENGINE_TIMEOUT: Duration = Duration::from_secs(600);

/// Lupine - a flow-run worker for sandboxed workflow execution
#[derive(Parser)]
#[command(name = "lupine")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.lupine)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Execute one run job against a flow version
  Run {
    /// Path to the flow version file (JSON)
    #[arg(long)]
    flow: PathBuf,

    /// Path to the job file (JSON)
    #[arg(long)]
    job: PathBuf,

    /// Path to the engine executable invoked against the prepared sandbox
    #[arg(long)]
    engine: PathBuf,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let cli = Cli::parse();

  let data_dir = cli.data_dir.unwrap_or_else(|| {
    dirs::home_dir()
      .expect("could not determine home directory")
      .join(".lupine")
  });

  match cli.command {
    Some(Commands::Run { flow, job, engine }) => {
      run_job(flow, job, engine, data_dir)?;
    }
    None => {
      println!("lupine - use --help to see available commands");
    }
  }

  Ok(())
}

fn run_job(flow_file: PathBuf, job_file: PathBuf, engine_bin: PathBuf, data_dir: PathBuf) -> Result<()> {
  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { run_job_async(flow_file, job_file, engine_bin, data_dir).await })
}

async fn run_job_async(
  flow_file: PathBuf,
  job_file: PathBuf,
  engine_bin: PathBuf,
  data_dir: PathBuf,
) -> Result<()> {
  // Read the flow version definition
  let flow_content = tokio::fs::read_to_string(&flow_file)
    .await
    .with_context(|| format!("failed to read flow file: {}", flow_file.display()))?;
  let version: FlowVersion = serde_json::from_str(&flow_content)
    .with_context(|| format!("failed to parse flow file: {}", flow_file.display()))?;

  // Read the job
  let job_content = tokio::fs::read_to_string(&job_file)
    .await
    .with_context(|| format!("failed to read job file: {}", job_file.display()))?;
  let job: RunJob = serde_json::from_str(&job_content)
    .with_context(|| format!("failed to parse job file: {}", job_file.display()))?;

  eprintln!("Loaded flow version: {}", version.display_name);
  eprintln!("Executing run: {}", job.run_id);

  // Seed the in-memory stores with the loaded definition and a queued run
  let versions = Arc::new(MemFlowVersionStore::new());
  versions.insert(version);

  let runs = Arc::new(MemFlowRunStore::new());
  runs.insert(FlowRun {
    id: job.run_id.clone(),
    project_id: job.project_id.clone(),
    flow_version_id: job.flow_version_id.clone(),
    status: FlowRunStatus::Running,
    pause_metadata: None,
    logs_file_id: None,
  });

  // Wire the worker against the data directory
  let worker = FlowWorker::new(WorkerServices {
    pool: SandboxPool::new(data_dir.join("sandboxes"), SANDBOX_POOL_SIZE),
    versions,
    runs: runs.clone(),
    files: Arc::new(FsFileStore::new(data_dir.join("files"))),
    engine: Arc::new(ProcessEngineInvoker::new(engine_bin, ENGINE_TIMEOUT)),
    pieces: Arc::new(FsPieceInstaller::new(data_dir.join("pieces"))),
    code_builder: Arc::new(PassthroughCodeBuilder),
    locks: Arc::new(LocalLockService::new()),
    capture: Arc::new(TracingErrorCapture),
  });

  worker
    .execute(job.clone())
    .await
    .context("flow run execution failed")?;

  let run = runs
    .get_one(&job.run_id, &job.project_id)
    .await
    .context("run not found after execution")?;

  println!("run {} finished with status {}", run.id, run.status);
  Ok(())
}
