//! Pure dialog transition function
//!
//! One event in, one new state plus a list of effects out. No I/O
//! happens here, so every path through the waterfall can be exercised
//! turn by turn in plain unit tests and the runtime stays a thin
//! executor.

use super::script;
use super::state::{Intent, SessionValues, Step};
use super::{DialogState, Effect, Event, SessionContext};
use crate::prompt::{self, PromptResult, PromptSpec};
use thiserror::Error;

/// Result of a dialog transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: DialogState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: DialogState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during a transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("step {step:?} cannot consume this reply: {reply}")]
    UnexpectedReply { step: Step, reply: String },
    #[error("step requires {0} but the waterfall never collected it")]
    MissingValue(&'static str),
}

/// Pure transition function
///
/// Given the same state and event this always produces the same result.
/// Effects come back in execution order; every user turn yields exactly
/// one bot `RecordTurn` and every transition ends with `PersistState`.
pub fn transition(
    state: &DialogState,
    _context: &SessionContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Reset abandons whatever was in flight. No turns are recorded.
        (_, Event::Reset) => {
            Ok(TransitionResult::new(DialogState::Fresh).with_effect(Effect::PersistState))
        }

        // Any message starts the waterfall. The text itself is recorded
        // but not interpreted; the reply is always the welcome menu.
        (DialogState::Fresh, Event::UserTurn { text }) => {
            let prompt = script::welcome_prompt();
            let body = prompt::render(&prompt);
            Ok(TransitionResult::new(DialogState::AwaitingReply {
                step: Step::Client,
                prompt,
                values: SessionValues::default(),
                retries: 0,
            })
            .with_effect(Effect::record_user(text))
            .with_effect(Effect::record_bot(body))
            .with_effect(Effect::PersistState))
        }

        // A reply to an outstanding prompt either advances the waterfall
        // or, if it cannot be parsed, re-asks the same prompt.
        (
            DialogState::AwaitingReply {
                step,
                prompt,
                values,
                retries,
            },
            Event::UserTurn { text },
        ) => match prompt::parse(prompt, &text) {
            Some(result) => advance(*step, values.clone(), result, &text),
            None => Ok(TransitionResult::new(DialogState::AwaitingReply {
                step: *step,
                prompt: prompt.clone(),
                values: values.clone(),
                retries: retries + 1,
            })
            .with_effect(Effect::record_user(text))
            .with_effect(Effect::record_bot(prompt::retry(prompt)))
            .with_effect(Effect::PersistState)),
        },
    }
}

/// What one waterfall step decided to do with its reply.
enum StepOutcome {
    /// Ask `prompt` and park at `step` until the next reply.
    Await { step: Step, prompt: PromptSpec },
    /// Skip straight to `step`, handing it `value` as a forwarded result.
    Forward { step: Step, value: bool },
    /// The waterfall ended, successfully or not.
    End {
        message: String,
        profile: Option<(Intent, Option<String>)>,
    },
}

/// Run the waterfall forward from `step` until it parks or ends.
///
/// Forward outcomes loop without rendering anything, which is how a
/// single "yes" can fall through steps and end the dialog in one turn.
/// Forward only ever moves down the waterfall, so the loop terminates.
fn advance(
    mut step: Step,
    mut values: SessionValues,
    mut result: PromptResult,
    user_text: &str,
) -> Result<TransitionResult, TransitionError> {
    loop {
        match handle_step(step, &mut values, result)? {
            StepOutcome::Await { step: next, prompt } => {
                let body = prompt::render(&prompt);
                return Ok(TransitionResult::new(DialogState::AwaitingReply {
                    step: next,
                    prompt,
                    values,
                    retries: 0,
                })
                .with_effect(Effect::record_user(user_text))
                .with_effect(Effect::record_bot(body))
                .with_effect(Effect::PersistState));
            }
            StepOutcome::Forward { step: next, value } => {
                step = next;
                result = PromptResult::Forwarded { value };
            }
            StepOutcome::End { message, profile } => {
                let mut out = TransitionResult::new(DialogState::Fresh)
                    .with_effect(Effect::record_user(user_text))
                    .with_effect(Effect::record_bot(message));
                if let Some((intent, client)) = profile {
                    out = out.with_effect(Effect::SaveProfile { intent, client });
                }
                return Ok(out
                    .with_effect(Effect::PersistState)
                    .with_effect(Effect::NotifyEnded));
            }
        }
    }
}

fn handle_step(
    step: Step,
    values: &mut SessionValues,
    result: PromptResult,
) -> Result<StepOutcome, TransitionError> {
    match step {
        Step::Client => handle_client(values, result),
        Step::Lookup => handle_lookup(values, result),
        Step::ArchitectureSummary => handle_architecture_summary(values, result),
        Step::Architecture => handle_architecture(values, result),
        Step::Summary => handle_summary(values, result),
    }
}

/// Step 2: the welcome menu was answered; branch on the chosen service.
fn handle_client(
    values: &mut SessionValues,
    result: PromptResult,
) -> Result<StepOutcome, TransitionError> {
    match result {
        PromptResult::Choice { value, .. } => {
            let intent =
                Intent::from_label(&value).ok_or(TransitionError::MissingValue("intent"))?;
            values.intent = Some(intent);
            let prompt = match intent {
                Intent::Architecture => script::client_name_prompt(),
                Intent::Specification => script::spec_question_prompt(),
            };
            Ok(StepOutcome::Await {
                step: Step::Lookup,
                prompt,
            })
        }
        other => Err(unexpected(Step::Client, &other)),
    }
}

/// Step 3: look up what the user asked for. The architecture branch
/// stores the client name; the specification branch serves its one
/// canned answer and does not keep the question.
fn handle_lookup(
    values: &mut SessionValues,
    result: PromptResult,
) -> Result<StepOutcome, TransitionError> {
    let intent = require_intent(values)?;
    match (intent, result) {
        (Intent::Architecture, PromptResult::Text { value }) => {
            let prompt = script::found_architecture_confirm(&value);
            values.client = Some(value);
            Ok(StepOutcome::Await {
                step: Step::ArchitectureSummary,
                prompt,
            })
        }
        (Intent::Specification, PromptResult::Text { .. }) => Ok(StepOutcome::Await {
            step: Step::ArchitectureSummary,
            prompt: script::spec_answer_confirm(),
        }),
        (_, other) => Err(unexpected(Step::Lookup, &other)),
    }
}

/// Step 4: the lookup result was offered; "yes" drills in.
///
/// On the architecture branch a "no" holds position: the components
/// question is asked, and whatever the user answers loops back to the
/// lookup offer. On the specification branch a "no" moves on with the
/// question re-asked, so the second answer is judged at the summary
/// step instead.
fn handle_architecture_summary(
    values: &mut SessionValues,
    result: PromptResult,
) -> Result<StepOutcome, TransitionError> {
    let intent = require_intent(values)?;
    match (intent, result) {
        (Intent::Architecture, PromptResult::Confirm { value: true }) => {
            let client = require_client(values)?;
            Ok(StepOutcome::Await {
                step: Step::Architecture,
                prompt: script::architecture_summary_confirm(client),
            })
        }
        (Intent::Architecture, PromptResult::Confirm { value: false }) => {
            let client = require_client(values)?;
            Ok(StepOutcome::Await {
                step: Step::ArchitectureSummary,
                prompt: script::components_prompt(client),
            })
        }
        (Intent::Architecture, PromptResult::Text { .. }) => {
            // Answer to the components question; offer the lookup again.
            let client = require_client(values)?;
            Ok(StepOutcome::Await {
                step: Step::ArchitectureSummary,
                prompt: script::found_architecture_confirm(client),
            })
        }
        (Intent::Specification, PromptResult::Confirm { value: true }) => Ok(StepOutcome::Forward {
            step: Step::Architecture,
            value: true,
        }),
        (Intent::Specification, PromptResult::Confirm { value: false }) => Ok(StepOutcome::Await {
            step: Step::Architecture,
            prompt: script::spec_question_prompt(),
        }),
        (_, other) => Err(unexpected(Step::ArchitectureSummary, &other)),
    }
}

/// Step 5: the detailed view was offered.
///
/// Architecture "yes" and a forwarded specification "yes" both fall
/// through to the summary step. An architecture "no" holds position the
/// same way step 4 does; a specification question asked here gets its
/// answer judged at the summary step.
fn handle_architecture(
    values: &mut SessionValues,
    result: PromptResult,
) -> Result<StepOutcome, TransitionError> {
    let intent = require_intent(values)?;
    match (intent, result) {
        (Intent::Architecture, PromptResult::Confirm { value: true })
        | (Intent::Specification, PromptResult::Forwarded { value: true }) => {
            Ok(StepOutcome::Forward {
                step: Step::Summary,
                value: true,
            })
        }
        (Intent::Architecture, PromptResult::Confirm { value: false }) => {
            let client = require_client(values)?;
            Ok(StepOutcome::Await {
                step: Step::Architecture,
                prompt: script::components_prompt(client),
            })
        }
        (Intent::Architecture, PromptResult::Text { .. }) => {
            let client = require_client(values)?;
            Ok(StepOutcome::Await {
                step: Step::Architecture,
                prompt: script::architecture_summary_confirm(client),
            })
        }
        (Intent::Specification, PromptResult::Text { .. }) => Ok(StepOutcome::Await {
            step: Step::Summary,
            prompt: script::spec_answer_confirm(),
        }),
        (_, other) => Err(unexpected(Step::Architecture, &other)),
    }
}

/// Step 6: only an explicit "yes" (direct or forwarded) counts as
/// success. Everything else ends the demo politely.
fn handle_summary(
    values: &mut SessionValues,
    result: PromptResult,
) -> Result<StepOutcome, TransitionError> {
    let intent = require_intent(values)?;
    match result {
        PromptResult::Confirm { value: true } | PromptResult::Forwarded { value: true } => {
            Ok(StepOutcome::End {
                message: script::success_message(intent),
                profile: Some((intent, values.client.clone())),
            })
        }
        _ => Ok(StepOutcome::End {
            message: script::EXIT_MESSAGE.to_string(),
            profile: None,
        }),
    }
}

fn require_intent(values: &SessionValues) -> Result<Intent, TransitionError> {
    values
        .intent
        .ok_or(TransitionError::MissingValue("intent"))
}

fn require_client(values: &SessionValues) -> Result<&str, TransitionError> {
    values
        .client
        .as_deref()
        .ok_or(TransitionError::MissingValue("client"))
}

fn unexpected(step: Step, result: &PromptResult) -> TransitionError {
    TransitionError::UnexpectedReply {
        step,
        reply: format!("{result:?}"),
    }
}
