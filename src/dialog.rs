//! Core dialog state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! the six-step demo waterfall lives entirely in `transition`, and the
//! runtime only executes the effects it asks for.

mod effect;
pub mod event;
pub mod script;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use event::Event;
pub use state::{DialogState, Intent, SessionContext, SessionValues, Step};
pub use transition::{transition, TransitionResult};
