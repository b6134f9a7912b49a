//! Lupine Sandbox
//!
//! This crate provides the sandbox pool: a bounded set of reusable, isolated
//! execution directories that workers check out by key for the duration of
//! one job.
//!
//! A sandbox's key uniquely determines its filesystem contents. When a
//! checkout finds a slot already bound to the requested key, the sandbox
//! comes back `cached` and the caller may skip the full rebuild. The checkout
//! handle returns the slot (and the capacity permit) on drop, so a sandbox is
//! released exactly once on every exit path.

mod pool;
mod sandbox;

pub use pool::{CheckedOutSandbox, SandboxPool};
pub use sandbox::Sandbox;

/// Error type for sandbox operations.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
  /// The pool was shut down while waiting for capacity.
  #[error("sandbox pool closed")]
  Closed,

  /// No free slot was available despite holding a capacity permit.
  #[error("sandbox pool exhausted")]
  Exhausted,

  /// An I/O error occurred on the sandbox filesystem.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}
