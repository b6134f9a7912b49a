//! Lupine File
//!
//! This crate provides the file storage trait and implementations for Lupine.
//! Files are content blobs with an id: flow-run logs, raw code sources, and
//! packaged code bundles all live here.
//!
//! A save without an id allocates a fresh one; a save with an id overwrites
//! that file in place (resumed runs overwrite their prior log file).

mod fs;
mod mem;

pub use fs::FsFileStore;
pub use mem::MemFileStore;

use async_trait::async_trait;
use bytes::Bytes;

/// A stored content blob.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
  pub id: String,
  pub project_id: String,
  pub data: Bytes,
}

/// Parameters for [`FileStore::save`].
#[derive(Debug, Clone)]
pub struct SaveFile {
  /// Overwrites this file when present; allocates a new id when absent.
  pub file_id: Option<String>,
  pub project_id: String,
  pub data: Bytes,
}

/// Error type for file storage operations.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
  /// The requested file was not found.
  #[error("file not found: {file_id}")]
  NotFound { file_id: String },

  /// An I/O error occurred.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

/// File storage trait.
///
/// Implementations provide the actual storage backend (filesystem, object
/// storage, database blobs).
#[async_trait]
pub trait FileStore: Send + Sync {
  /// Retrieve a file by id, scoped to a project.
  async fn get_one(&self, project_id: &str, file_id: &str) -> Result<File, FileError>;

  /// Store a file. Supplying `file_id` overwrites; omitting it allocates.
  async fn save(&self, save: SaveFile) -> Result<File, FileError>;
}
