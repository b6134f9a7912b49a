use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use crate::SandboxError;

/// One isolated execution directory, owned by the pool.
///
/// Layout under the root:
/// ```text
/// {root}/
/// ├── codes/    packaged code bundles, one file per artifact id
/// ├── flows/    serialized flow version, {version_id}.json
/// └── scratch/  per-execution working state, cleared between jobs
/// ```
#[derive(Debug)]
pub struct Sandbox {
  id: usize,
  cached: bool,
  root: PathBuf,
}

impl Sandbox {
  pub(crate) fn new(id: usize, cached: bool, root: PathBuf) -> Self {
    Self { id, cached, root }
  }

  /// The pool slot index backing this sandbox.
  pub fn id(&self) -> usize {
    self.id
  }

  /// Whether this sandbox was already primed for its key by a prior job.
  pub fn cached(&self) -> bool {
    self.cached
  }

  /// Root directory of the sandbox.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Directory holding packaged code bundles.
  pub fn codes_dir(&self) -> PathBuf {
    self.root.join("codes")
  }

  /// Directory holding the serialized flow version.
  pub fn flows_dir(&self) -> PathBuf {
    self.root.join("flows")
  }

  /// Per-execution scratch directory.
  pub fn scratch_dir(&self) -> PathBuf {
    self.root.join("scratch")
  }

  /// Wipe the sandbox and recreate the full directory layout.
  ///
  /// Used when the sandbox is not yet primed for its key.
  pub async fn recreate(&self) -> Result<(), SandboxError> {
    remove_dir_if_present(&self.root).await?;
    fs::create_dir_all(self.codes_dir()).await?;
    fs::create_dir_all(self.flows_dir()).await?;
    fs::create_dir_all(self.scratch_dir()).await?;
    Ok(())
  }

  /// Clear per-execution scratch state, leaving `codes/` and `flows/` primed.
  ///
  /// Used when the sandbox comes back cached for its key.
  pub async fn reset(&self) -> Result<(), SandboxError> {
    let scratch = self.scratch_dir();
    remove_dir_if_present(&scratch).await?;
    fs::create_dir_all(&scratch).await?;
    Ok(())
  }
}

async fn remove_dir_if_present(path: &Path) -> Result<(), SandboxError> {
  match fs::remove_dir_all(path).await {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
    Err(e) => Err(SandboxError::Io(e)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn recreate_wipes_reset_keeps_primed_dirs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let sandbox = Sandbox::new(0, false, dir.path().join("sandbox-0"));

    sandbox.recreate().await.expect("recreate");
    fs::write(sandbox.codes_dir().join("artifact"), b"bundle")
      .await
      .expect("write code");
    fs::write(sandbox.scratch_dir().join("state"), b"tmp")
      .await
      .expect("write scratch");

    sandbox.reset().await.expect("reset");
    assert!(sandbox.codes_dir().join("artifact").exists());
    assert!(!sandbox.scratch_dir().join("state").exists());
    assert!(sandbox.scratch_dir().exists());

    sandbox.recreate().await.expect("recreate again");
    assert!(!sandbox.codes_dir().join("artifact").exists());
  }
}
