use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;

use crate::{File, FileError, FileStore, SaveFile};

/// Filesystem-based file store.
///
/// Files are stored as `{root}/{project_id}/{file_id}`.
pub struct FsFileStore {
  root: PathBuf,
}

impl FsFileStore {
  /// Create a new filesystem store at the given root path.
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  /// Get the root directory of the store.
  pub fn root(&self) -> &Path {
    &self.root
  }

  fn file_path(&self, project_id: &str, file_id: &str) -> PathBuf {
    self.root.join(project_id).join(file_id)
  }
}

#[async_trait]
impl FileStore for FsFileStore {
  async fn get_one(&self, project_id: &str, file_id: &str) -> Result<File, FileError> {
    let path = self.file_path(project_id, file_id);
    let data = match fs::read(&path).await {
      Ok(data) => data,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        return Err(FileError::NotFound {
          file_id: file_id.to_string(),
        });
      }
      Err(e) => return Err(FileError::Io(e)),
    };

    Ok(File {
      id: file_id.to_string(),
      project_id: project_id.to_string(),
      data: Bytes::from(data),
    })
  }

  async fn save(&self, save: SaveFile) -> Result<File, FileError> {
    let file_id = save
      .file_id
      .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let path = self.file_path(&save.project_id, &file_id);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).await?;
    }
    fs::write(&path, &save.data).await?;

    Ok(File {
      id: file_id,
      project_id: save.project_id,
      data: save.data,
    })
  }
}
