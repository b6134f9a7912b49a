use std::ops::Deref;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::{Sandbox, SandboxError};

/// A bounded pool of reusable sandboxes, checked out by key.
///
/// The pool is an explicit object with its lifetime bound to the process:
/// construct it once and pass it into workers by reference. Capacity is
/// enforced with a semaphore; slot bookkeeping lives behind a mutex with
/// short critical sections.
#[derive(Clone)]
pub struct SandboxPool {
  inner: Arc<PoolInner>,
}

struct PoolInner {
  root: PathBuf,
  semaphore: Arc<Semaphore>,
  state: Mutex<PoolState>,
}

struct PoolState {
  slots: Vec<Slot>,
  tick: u64,
}

#[derive(Clone, Default)]
struct Slot {
  key: Option<String>,
  in_use: bool,
  last_used: u64,
}

impl SandboxPool {
  /// Create a pool of `capacity` sandboxes rooted at `root`.
  pub fn new(root: impl Into<PathBuf>, capacity: usize) -> Self {
    Self {
      inner: Arc::new(PoolInner {
        root: root.into(),
        semaphore: Arc::new(Semaphore::new(capacity)),
        state: Mutex::new(PoolState {
          slots: vec![Slot::default(); capacity],
          tick: 0,
        }),
      }),
    }
  }

  /// Check out a sandbox for `key`, waiting for capacity if the pool is full.
  ///
  /// If a slot is already bound to `key`, that slot is reused and the sandbox
  /// reports `cached() == true`. Otherwise the least recently used free slot
  /// is rebound to `key` and the caller must prime it.
  pub async fn checkout(&self, key: &str) -> Result<CheckedOutSandbox, SandboxError> {
    let permit = self
      .inner
      .semaphore
      .clone()
      .acquire_owned()
      .await
      .map_err(|_| SandboxError::Closed)?;

    let (slot_id, cached) = {
      let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());

      let slot_id = match state
        .slots
        .iter()
        .position(|s| !s.in_use && s.key.as_deref() == Some(key))
      {
        Some(id) => id,
        None => state
          .slots
          .iter()
          .enumerate()
          .filter(|(_, s)| !s.in_use)
          .min_by_key(|(_, s)| s.last_used)
          .map(|(id, _)| id)
          .ok_or(SandboxError::Exhausted)?,
      };

      let cached = state.slots[slot_id].key.as_deref() == Some(key);
      state.tick += 1;
      let tick = state.tick;
      let slot = &mut state.slots[slot_id];
      slot.key = Some(key.to_string());
      slot.in_use = true;
      slot.last_used = tick;
      (slot_id, cached)
    };

    debug!(slot_id, key, cached, "sandbox_checked_out");

    let root = self.inner.root.join(format!("sandbox-{slot_id}"));
    Ok(CheckedOutSandbox {
      sandbox: Sandbox::new(slot_id, cached, root),
      inner: Arc::clone(&self.inner),
      _permit: permit,
    })
  }

  /// Number of sandboxes currently available for checkout.
  pub fn available(&self) -> usize {
    self.inner.semaphore.available_permits()
  }
}

/// An exclusively held sandbox.
///
/// Dropping the handle returns the slot and its capacity permit to the pool,
/// so release is guaranteed on every exit path, including panics.
pub struct CheckedOutSandbox {
  sandbox: Sandbox,
  inner: Arc<PoolInner>,
  _permit: OwnedSemaphorePermit,
}

impl Deref for CheckedOutSandbox {
  type Target = Sandbox;

  fn deref(&self) -> &Sandbox {
    &self.sandbox
  }
}

impl Drop for CheckedOutSandbox {
  fn drop(&mut self) {
    let mut state = self.inner.state.lock().unwrap_or_else(|e| e.into_inner());
    state.slots[self.sandbox.id()].in_use = false;
    debug!(slot_id = self.sandbox.id(), "sandbox_returned");
  }
}
