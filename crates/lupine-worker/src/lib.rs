//! Lupine Worker
//!
//! This crate is the flow-run worker: given one [`lupine_flow::RunJob`], it
//! checks a sandbox out of the pool, primes it with the flow version's
//! definition and built code artifacts, hands it to the external engine,
//! persists the execution trace, and transitions the run's lifecycle state.
//!
//! The worker owns the core logic in [`FlowWorker`], [`SandboxPreparer`]
//! and [`ArtifactBuilder`], and drives everything else through seams:
//! stores, engine invoker, piece installer, code builder, lock service and
//! error capture.

mod artifacts;
mod capture;
mod code;
mod error;
mod input;
mod lock;
mod pieces;
mod prepare;
mod worker;

pub use artifacts::{ArtifactBuilder, BuiltArtifacts};
pub use capture::{ErrorCapture, TracingErrorCapture};
pub use code::{BuildError, CodeBuilder, PassthroughCodeBuilder};
pub use error::WorkerError;
pub use lock::{LocalLockService, LockError, LockGuard, LockService};
pub use pieces::{FsPieceInstaller, InstallError, PieceInstaller};
pub use prepare::SandboxPreparer;
pub use worker::{FlowWorker, WorkerServices};
