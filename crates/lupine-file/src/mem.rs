use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::{File, FileError, FileStore, SaveFile};

/// In-memory file store, for tests and single-process wiring.
#[derive(Default)]
pub struct MemFileStore {
  files: RwLock<HashMap<(String, String), File>>,
}

impl MemFileStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl FileStore for MemFileStore {
  async fn get_one(&self, project_id: &str, file_id: &str) -> Result<File, FileError> {
    let files = self.files.read().unwrap_or_else(|e| e.into_inner());
    files
      .get(&(project_id.to_string(), file_id.to_string()))
      .cloned()
      .ok_or_else(|| FileError::NotFound {
        file_id: file_id.to_string(),
      })
  }

  async fn save(&self, save: SaveFile) -> Result<File, FileError> {
    let file_id = save
      .file_id
      .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let file = File {
      id: file_id.clone(),
      project_id: save.project_id.clone(),
      data: save.data,
    };

    let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
    files.insert((save.project_id, file_id), file.clone());

    Ok(file)
  }
}

#[cfg(test)]
mod tests {
  use bytes::Bytes;

  use super::*;

  #[tokio::test]
  async fn files_are_scoped_by_project() {
    let store = MemFileStore::new();
    let saved = store
      .save(SaveFile {
        file_id: None,
        project_id: "project-a".to_string(),
        data: Bytes::from_static(b"blob"),
      })
      .await
      .expect("save");

    assert!(store.get_one("project-a", &saved.id).await.is_ok());
    assert!(matches!(
      store.get_one("project-b", &saved.id).await,
      Err(FileError::NotFound { .. })
    ));
  }
}
