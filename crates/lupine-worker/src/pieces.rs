use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lupine_flow::PiecePackage;
use tokio::fs;
use tracing::debug;

/// Error type for piece installation.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
  /// The requested piece package is not present in the registry.
  #[error("piece not found in registry: {name}@{version}")]
  PieceNotFound { name: String, version: String },

  /// An I/O error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// Resolves and installs piece packages into a sandbox.
#[async_trait]
pub trait PieceInstaller: Send + Sync {
  /// Install the given pieces under `target`.
  async fn install(&self, target: &Path, pieces: &[PiecePackage]) -> Result<(), InstallError>;
}

/// Filesystem-backed piece installer.
///
/// Pieces live in a registry directory as `{root}/{name}--{version}/` (with
/// `/` in the piece name folded to `--`) and are materialised under
/// `{target}/pieces/{name}--{version}/`.
pub struct FsPieceInstaller {
  registry_root: PathBuf,
}

impl FsPieceInstaller {
  /// Create a new installer resolving pieces from the given registry root.
  pub fn new(registry_root: impl Into<PathBuf>) -> Self {
    Self {
      registry_root: registry_root.into(),
    }
  }

  fn dir_name(piece: &PiecePackage) -> String {
    format!("{}--{}", piece.name.replace('/', "--"), piece.version)
  }
}

#[async_trait]
impl PieceInstaller for FsPieceInstaller {
  async fn install(&self, target: &Path, pieces: &[PiecePackage]) -> Result<(), InstallError> {
    let pieces_dir = target.join("pieces");
    fs::create_dir_all(&pieces_dir).await?;

    for piece in pieces {
      let dir_name = Self::dir_name(piece);
      let source = self.registry_root.join(&dir_name);

      match fs::metadata(&source).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {
          return Err(InstallError::PieceNotFound {
            name: piece.name.clone(),
            version: piece.version.clone(),
          });
        }
        Err(e) => return Err(InstallError::Io(e)),
      }

      let dest = pieces_dir.join(&dir_name);
      fs::create_dir_all(&dest).await?;

      let manifest = source.join("manifest.json");
      match fs::copy(&manifest, dest.join("manifest.json")).await {
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(InstallError::Io(e)),
      }

      debug!(
        piece = %piece.name,
        version = %piece.version,
        "piece_installed"
      );
    }

    Ok(())
  }
}
