use std::sync::Arc;

use futures::future;
use lupine_file::{File, FileStore, SaveFile};
use lupine_flow::{ArtifactCache, CodeSettings, FlowVersion};
use lupine_store::FlowVersionStore;
use tracing::info;

use crate::code::CodeBuilder;
use crate::error::WorkerError;

/// Result of building a flow version's code steps: one packaged file per
/// step, plus the cache of builds performed now (source id → packaged id).
#[derive(Debug)]
pub struct BuiltArtifacts {
  pub files: Vec<File>,
  pub cache: ArtifactCache,
}

/// Turns a flow version's code steps into packaged, memoized artifacts.
///
/// A step whose packaged id is already set is fetched, never rebuilt. Builds
/// for the remaining steps run concurrently; there is no data dependency
/// between code steps. When anything was newly built, the version is
/// persisted with the cache applied so future preparations skip the rebuild.
pub struct ArtifactBuilder {
  files: Arc<dyn FileStore>,
  code_builder: Arc<dyn CodeBuilder>,
  versions: Arc<dyn FlowVersionStore>,
}

impl ArtifactBuilder {
  pub fn new(
    files: Arc<dyn FileStore>,
    code_builder: Arc<dyn CodeBuilder>,
    versions: Arc<dyn FlowVersionStore>,
  ) -> Self {
    Self {
      files,
      code_builder,
      versions,
    }
  }

  /// Build (or fetch) the packaged artifact of every code step.
  pub async fn build(
    &self,
    version: &FlowVersion,
    project_id: &str,
  ) -> Result<BuiltArtifacts, WorkerError> {
    let code_steps: Vec<(String, CodeSettings)> = version
      .all_steps()
      .iter()
      .filter_map(|step| {
        step
          .code_settings()
          .map(|settings| (step.name().to_string(), settings.clone()))
      })
      .collect();

    let builds = code_steps
      .into_iter()
      .map(|(step_name, settings)| self.artifact_file(step_name, settings, project_id));
    let results = future::try_join_all(builds).await?;

    let mut files = Vec::with_capacity(results.len());
    let mut cache = ArtifactCache::new();
    for (file, built) in results {
      if let Some((source_id, packaged_id)) = built {
        cache.insert(source_id, packaged_id);
      }
      files.push(file);
    }

    if !cache.is_empty() {
      let updated = version.clone().with_artifact_cache(&cache);
      self.versions.overwrite(updated).await?;
      info!(
        version_id = %version.id,
        built = cache.len(),
        "artifact_cache_persisted"
      );
    }

    Ok(BuiltArtifacts { files, cache })
  }

  /// Fetch the packaged file for one code step, building it first if the
  /// memoization slot is empty. Returns the file and, for fresh builds, the
  /// cache entry to record.
  async fn artifact_file(
    &self,
    step_name: String,
    settings: CodeSettings,
    project_id: &str,
  ) -> Result<(File, Option<(String, String)>), WorkerError> {
    if let Some(packaged_id) = settings.artifact_packaged_id {
      let file = self.files.get_one(project_id, &packaged_id).await?;
      return Ok((file, None));
    }

    let source_id = settings
      .artifact_source_id
      .ok_or_else(|| WorkerError::Validation {
        message: format!("artifact_source_id is missing on code step '{step_name}'"),
      })?;

    info!(step = %step_name, source_id = %source_id, "building_code_artifact");

    let source = self.files.get_one(project_id, &source_id).await?;
    let bundle = self.code_builder.build(source.data).await?;
    let packaged = self
      .files
      .save(SaveFile {
        file_id: None,
        project_id: project_id.to_string(),
        data: bundle,
      })
      .await?;

    let packaged_id = packaged.id.clone();
    Ok((packaged, Some((source_id, packaged_id))))
  }
}
