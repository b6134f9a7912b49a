//! Lupine Flow
//!
//! This crate contains the serializable domain types for Lupine: flow
//! versions with their step trees, flow runs with their lifecycle state, and
//! the job payload a worker receives for one execution.
//!
//! A flow version is a tree rooted at a trigger; actions chain through
//! `next_action` and branch arms. DRAFT versions are mutable and must never
//! be treated as cacheable identities; LOCKED versions are immutable.

mod job;
mod run;
mod step;
mod version;

pub use job::{ExecutionType, RunJob};
pub use run::{FlowRun, FlowRunStatus, PauseMetadata};
pub use step::{Action, ActionKind, CodeSettings, PiecePackage, PieceSettings, Step, Trigger, TriggerKind};
pub use version::{ArtifactCache, FlowVersion, FlowVersionState};
