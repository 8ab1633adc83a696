//! Dialog state types
//!
//! A session is either `Fresh` (no waterfall running) or parked at one
//! step waiting for the user's reply to a specific prompt. The whole
//! state serializes to JSON and round-trips through the sessions table,
//! so a restarted server resumes every dialog exactly where it stood.

use serde::{Deserialize, Serialize};

use crate::prompt::PromptSpec;

/// Which of the two demo services the user picked at the welcome menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Architecture,
    Specification,
}

impl Intent {
    /// Case-insensitive match against the welcome menu labels.
    pub fn from_label(label: &str) -> Option<Self> {
        if label.eq_ignore_ascii_case(super::script::ARCHITECTURE) {
            Some(Self::Architecture)
        } else if label.eq_ignore_ascii_case(super::script::SPECIFICATION) {
            Some(Self::Specification)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Architecture => write!(f, "{}", super::script::ARCHITECTURE),
            Self::Specification => write!(f, "{}", super::script::SPECIFICATION),
        }
    }
}

/// Values collected so far in the running waterfall.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    /// Client name, collected on the architecture branch only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
}

/// The step whose prompt is currently outstanding.
///
/// Steps map onto the demo's fixed waterfall: pick a service, look it
/// up, review the result, drill in, then confirm delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Client,
    Lookup,
    ArchitectureSummary,
    Architecture,
    Summary,
}

impl Step {
    /// One-based position in the waterfall. The welcome turn is step 1,
    /// so the first reply lands at 2.
    pub fn index(self) -> u8 {
        match self {
            Self::Client => 2,
            Self::Lookup => 3,
            Self::ArchitectureSummary => 4,
            Self::Architecture => 5,
            Self::Summary => 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogState {
    /// No waterfall in progress. Any user message starts one.
    #[default]
    Fresh,
    /// Parked at `step`, waiting for a reply to `prompt`.
    AwaitingReply {
        step: Step,
        prompt: PromptSpec,
        values: SessionValues,
        /// Consecutive replies the outstanding prompt failed to parse.
        #[serde(default)]
        retries: u32,
    },
}

impl DialogState {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::AwaitingReply { .. })
    }
}

/// Per-session data the transition function can read but never writes.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }
}
