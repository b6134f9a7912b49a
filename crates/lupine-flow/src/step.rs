use serde::{Deserialize, Serialize};

/// A step of a flow version, either the trigger or an action.
///
/// Borrowed view produced by [`crate::FlowVersion::all_steps`].
#[derive(Debug, Clone, Copy)]
pub enum Step<'a> {
  Trigger(&'a Trigger),
  Action(&'a Action),
}

impl<'a> Step<'a> {
  /// The step's name, unique within one version.
  pub fn name(&self) -> &'a str {
    match self {
      Step::Trigger(trigger) => &trigger.name,
      Step::Action(action) => &action.name,
    }
  }

  /// The piece package this step depends on, if it is a piece step.
  pub fn piece(&self) -> Option<PiecePackage> {
    let settings = match self {
      Step::Trigger(trigger) => match &trigger.kind {
        TriggerKind::Piece { settings } => settings,
        _ => return None,
      },
      Step::Action(action) => match &action.kind {
        ActionKind::Piece { settings } => settings,
        _ => return None,
      },
    };

    Some(PiecePackage {
      name: settings.piece_name.clone(),
      version: settings.piece_version.clone(),
    })
  }

  /// The code settings of this step, if it is a code step.
  pub fn code_settings(&self) -> Option<&'a CodeSettings> {
    match self {
      Step::Action(action) => match &action.kind {
        ActionKind::Code { settings } => Some(settings),
        _ => None,
      },
      Step::Trigger(_) => None,
    }
  }
}

/// The trigger step that initiates a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
  pub name: String,
  pub display_name: String,
  #[serde(flatten)]
  pub kind: TriggerKind,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next_action: Option<Box<Action>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerKind {
  /// Placeholder trigger with no behaviour.
  Empty,
  /// Fired by an inbound webhook.
  Webhook,
  /// Backed by a piece's trigger export.
  Piece { settings: PieceSettings },
}

/// An action step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
  pub name: String,
  pub display_name: String,
  #[serde(flatten)]
  pub kind: ActionKind,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub next_action: Option<Box<Action>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
  /// Executes a piece's action export.
  Piece { settings: PieceSettings },
  /// Executes a packaged code artifact.
  Code { settings: CodeSettings },
  /// Splits the flow into success/failure arms.
  Branch {
    #[serde(skip_serializing_if = "Option::is_none")]
    on_success_action: Option<Box<Action>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    on_failure_action: Option<Box<Action>>,
  },
}

/// Settings of a piece-backed step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceSettings {
  pub piece_name: String,
  pub piece_version: String,
  #[serde(default)]
  pub input: serde_json::Value,
}

/// Settings of a code step.
///
/// `artifact_packaged_id` is the memoization slot for the built bundle: it is
/// absent until the first successful build and filled in through
/// [`crate::FlowVersion::with_artifact_cache`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeSettings {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub artifact_source_id: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub artifact_packaged_id: Option<String>,
}

/// A named, versioned piece package to install into a sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PiecePackage {
  pub name: String,
  pub version: String,
}
