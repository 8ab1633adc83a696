//! Events fed into the dialog transition function.

/// Everything that can happen to a session, from the dialog's point of
/// view. The runtime turns API calls into these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The user sent a message.
    UserTurn { text: String },
    /// Abandon any running waterfall and return to `Fresh`.
    Reset,
}
