use async_trait::async_trait;
use bytes::Bytes;

/// Error type for code builds.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
  #[error("code build failed: {message}")]
  Failed { message: String },
}

/// Compiles a code step's raw source into an executable bundle.
///
/// How compilation works is not this crate's concern; the worker only
/// sequences and memoizes builds.
#[async_trait]
pub trait CodeBuilder: Send + Sync {
  async fn build(&self, source: Bytes) -> Result<Bytes, BuildError>;
}

/// Passes sources through unchanged, for deployments whose code steps ship
/// prebuilt bundles.
pub struct PassthroughCodeBuilder;

#[async_trait]
impl CodeBuilder for PassthroughCodeBuilder {
  async fn build(&self, source: Bytes) -> Result<Bytes, BuildError> {
    Ok(source)
  }
}
