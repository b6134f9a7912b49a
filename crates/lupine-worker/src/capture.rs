use tracing::error;

use crate::error::WorkerError;

/// Collaborator that receives unclassified worker errors.
///
/// The orchestrator reports each unclassified error exactly once before
/// finishing the run as `InternalError`. Timeouts are never reported here.
pub trait ErrorCapture: Send + Sync {
  fn capture(&self, error: &WorkerError);
}

/// Default capture that records the error on the log stream. Deployments
/// wire an exception tracker behind the trait instead.
pub struct TracingErrorCapture;

impl ErrorCapture for TracingErrorCapture {
  fn capture(&self, error: &WorkerError) {
    error!(error = %error, "worker_error_captured");
  }
}
