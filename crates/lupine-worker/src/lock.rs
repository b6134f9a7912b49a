use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex as AsyncMutex;

/// Error type for lock acquisition.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
  /// The lock was not released by its holder within the bounded wait.
  #[error("timed out acquiring lock '{key}' after {timeout_ms}ms")]
  Timeout { key: String, timeout_ms: u64 },
}

/// A held named lock. Dropping the guard releases the lock, so release is
/// guaranteed on every exit path.
pub struct LockGuard {
  _held: Box<dyn Any + Send>,
}

impl std::fmt::Debug for LockGuard {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("LockGuard").finish_non_exhaustive()
  }
}

impl LockGuard {
  pub fn new(held: impl Any + Send) -> Self {
    Self {
      _held: Box::new(held),
    }
  }
}

/// Named, timeout-bound mutual exclusion.
///
/// At most one holder per key at a time. The in-process implementation below
/// serializes workers within one process; a multi-worker deployment swaps in
/// a shared implementation behind the same trait.
#[async_trait]
pub trait LockService: Send + Sync {
  /// Acquire the lock named `key`, waiting at most `timeout`.
  async fn acquire(&self, key: &str, timeout: Duration) -> Result<LockGuard, LockError>;
}

/// In-process lock service keyed by name.
#[derive(Default)]
pub struct LocalLockService {
  locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl LocalLockService {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl LockService for LocalLockService {
  async fn acquire(&self, key: &str, timeout: Duration) -> Result<LockGuard, LockError> {
    let mutex = {
      let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
      Arc::clone(locks.entry(key.to_string()).or_default())
    };

    match tokio::time::timeout(timeout, mutex.lock_owned()).await {
      Ok(guard) => Ok(LockGuard::new(guard)),
      Err(_) => Err(LockError::Timeout {
        key: key.to_string(),
        timeout_ms: timeout.as_millis() as u64,
      }),
    }
  }
}
