use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::step::{Action, ActionKind, CodeSettings, PiecePackage, Step, Trigger};

/// Build results for code steps, keyed by `artifact_source_id` with the
/// packaged file id as value.
///
/// Returned by the artifact builder alongside the files it produced and
/// applied to a version through [`FlowVersion::with_artifact_cache`], rather
/// than written into the step tree through a shared reference.
pub type ArtifactCache = HashMap<String, String>;

/// One immutable-once-locked version of a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowVersion {
  pub id: String,
  pub flow_id: String,
  pub display_name: String,
  pub state: FlowVersionState,
  pub trigger: Trigger,
}

/// Lifecycle state of a flow version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowVersionState {
  /// Still editable in the builder. Never cacheable as a sandbox identity.
  Draft,
  /// Frozen. Safe to cache by version id.
  Locked,
}

impl FlowVersion {
  /// Flat enumeration of every step: the trigger, then every action reachable
  /// through `next_action` chains and branch arms.
  pub fn all_steps(&self) -> Vec<Step<'_>> {
    let mut steps = vec![Step::Trigger(&self.trigger)];
    collect_actions(self.trigger.next_action.as_deref(), &mut steps);
    steps
  }

  /// The distinct piece packages referenced by this version's steps.
  pub fn pieces(&self) -> Vec<PiecePackage> {
    let mut pieces = Vec::new();
    for step in self.all_steps() {
      if let Some(piece) = step.piece() {
        if !pieces.contains(&piece) {
          pieces.push(piece);
        }
      }
    }
    pieces
  }

  /// Apply an artifact cache, filling the `artifact_packaged_id` slot of every
  /// code step whose `artifact_source_id` has an entry.
  pub fn with_artifact_cache(mut self, cache: &ArtifactCache) -> FlowVersion {
    visit_code_settings(self.trigger.next_action.as_deref_mut(), &mut |settings| {
      let Some(source_id) = settings.artifact_source_id.as_deref() else {
        return;
      };
      if let Some(packaged_id) = cache.get(source_id) {
        settings.artifact_packaged_id = Some(packaged_id.clone());
      }
    });
    self
  }
}

fn collect_actions<'a>(mut action: Option<&'a Action>, steps: &mut Vec<Step<'a>>) {
  while let Some(current) = action {
    steps.push(Step::Action(current));
    if let ActionKind::Branch {
      on_success_action,
      on_failure_action,
    } = &current.kind
    {
      collect_actions(on_success_action.as_deref(), steps);
      collect_actions(on_failure_action.as_deref(), steps);
    }
    action = current.next_action.as_deref();
  }
}

fn visit_code_settings(mut action: Option<&mut Action>, visit: &mut impl FnMut(&mut CodeSettings)) {
  while let Some(current) = action {
    match &mut current.kind {
      ActionKind::Code { settings } => visit(settings),
      ActionKind::Branch {
        on_success_action,
        on_failure_action,
      } => {
        visit_code_settings(on_success_action.as_deref_mut(), visit);
        visit_code_settings(on_failure_action.as_deref_mut(), visit);
      }
      ActionKind::Piece { .. } => {}
    }
    action = current.next_action.as_deref_mut();
  }
}
