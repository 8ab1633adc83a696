//! Side effects requested by dialog transitions.
//!
//! The transition function stays pure; anything that touches the
//! database or other sessions comes back as an `Effect` for the runtime
//! to execute, in order.

use crate::db::Sender;

use super::state::Intent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a turn to the session transcript.
    RecordTurn { sender: Sender, body: String },
    /// Write the post-transition state to the sessions table.
    PersistState,
    /// A waterfall ran to a successful end; store what it collected.
    SaveProfile {
        intent: Intent,
        client: Option<String>,
    },
    /// Tell stream subscribers the dialog ended.
    NotifyEnded,
}

impl Effect {
    pub fn record_user(body: impl Into<String>) -> Self {
        Self::RecordTurn {
            sender: Sender::User,
            body: body.into(),
        }
    }

    pub fn record_bot(body: impl Into<String>) -> Self {
        Self::RecordTurn {
            sender: Sender::Bot,
            body: body.into(),
        }
    }
}
