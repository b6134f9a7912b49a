use std::sync::Arc;
use std::time::Duration;

use lupine_flow::FlowVersion;
use lupine_sandbox::Sandbox;
use lupine_store::FlowVersionStore;
use tokio::fs;
use tracing::debug;

use crate::artifacts::ArtifactBuilder;
use crate::error::WorkerError;
use crate::lock::LockService;

const PREPARE_LOCK_TIMEOUT: Duration = Duration::from_secs(60);

/// Populates a sandbox's filesystem with one flow version, exactly once per
/// version identity at a time.
///
/// All writes happen under the named lock for the version id, so two workers
/// racing to prime sandboxes for the same version never interleave writes or
/// build the same artifact twice.
pub struct SandboxPreparer {
  locks: Arc<dyn LockService>,
  versions: Arc<dyn FlowVersionStore>,
  artifacts: ArtifactBuilder,
}

impl SandboxPreparer {
  pub fn new(
    locks: Arc<dyn LockService>,
    versions: Arc<dyn FlowVersionStore>,
    artifacts: ArtifactBuilder,
  ) -> Self {
    Self {
      locks,
      versions,
      artifacts,
    }
  }

  /// Write the version's code bundles to `codes/` and its definition to
  /// `flows/{version_id}.json`. Returns the version as written, with final
  /// packaged artifact ids on every code step.
  pub async fn prepare(
    &self,
    sandbox: &Sandbox,
    version_id: &str,
    project_id: &str,
  ) -> Result<FlowVersion, WorkerError> {
    debug!(version_id, "acquiring_preparation_lock");
    let _lock = self.locks.acquire(version_id, PREPARE_LOCK_TIMEOUT).await?;

    // Re-read under the lock: a preparation that beat us to it may have
    // persisted packaged artifact ids already.
    let version = self.versions.get_one(version_id).await?;

    // Codes before flows: the written definition must carry the final
    // packaged ids produced here.
    fs::create_dir_all(sandbox.codes_dir()).await?;
    let built = self.artifacts.build(&version, project_id).await?;
    for file in &built.files {
      fs::write(sandbox.codes_dir().join(&file.id), &file.data).await?;
    }

    let version = version.with_artifact_cache(&built.cache);
    fs::create_dir_all(sandbox.flows_dir()).await?;
    let definition = serde_json::to_vec(&version)?;
    fs::write(
      sandbox.flows_dir().join(format!("{version_id}.json")),
      definition,
    )
    .await?;

    debug!(version_id, "releasing_preparation_lock");
    Ok(version)
  }
}
