//! Prompt engine
//!
//! Renders prompt specifications as plain-text messages and parses raw
//! user replies into typed results. Unrecognized input never produces an
//! error: `parse` returns `None` and the dialog re-prompts with `retry`.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Kind of reply a prompt expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    /// Free text, any non-empty reply
    Text,
    /// One of a fixed list of literal options
    Choice,
    /// Yes or no
    Confirm,
}

/// What to render next, and what to parse the next raw input against.
///
/// The spec is stored in the session state between turns so the kind that
/// was rendered is always the kind the next reply is parsed as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSpec {
    pub kind: PromptKind,
    pub text: String,
    /// Literal options, only for `PromptKind::Choice`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl PromptSpec {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: PromptKind::Text,
            text: text.into(),
            choices: Vec::new(),
        }
    }

    pub fn choice(text: impl Into<String>, choices: &[&str]) -> Self {
        Self {
            kind: PromptKind::Choice,
            text: text.into(),
            choices: choices.iter().map(ToString::to_string).collect(),
        }
    }

    pub fn confirm(text: impl Into<String>) -> Self {
        Self {
            kind: PromptKind::Confirm,
            text: text.into(),
            choices: Vec::new(),
        }
    }
}

/// A raw reply parsed against the awaited prompt.
///
/// `Forwarded` is never produced by `parse`; the dialog controller uses it
/// when a step skips rendering and hands a value to the next step within
/// the same turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptResult {
    /// Free-text reply, trimmed, never empty
    Text { value: String },
    /// One of the literal options
    Choice { index: usize, value: String },
    /// Yes/no reply
    Confirm { value: bool },
    /// Value passed forward by a step that skipped rendering
    Forwarded { value: bool },
}

/// Render a prompt specification as the outbound message body.
///
/// Choice prompts get a numbered option list and confirm prompts a
/// `(1) Yes or (2) No` suffix, standing in for the buttons a rich chat
/// channel would show.
pub fn render(spec: &PromptSpec) -> String {
    match spec.kind {
        PromptKind::Text => spec.text.clone(),
        PromptKind::Choice => {
            let mut out = spec.text.clone();
            out.push('\n');
            for (i, choice) in spec.choices.iter().enumerate() {
                let _ = write!(out, "\n   {}. {choice}", i + 1);
            }
            out
        }
        PromptKind::Confirm => format!("{} (1) Yes or (2) No", spec.text),
    }
}

/// Parse a raw reply against the spec. `None` means the input was not
/// recognized and the caller should re-prompt.
pub fn parse(spec: &PromptSpec, raw: &str) -> Option<PromptResult> {
    let input = raw.trim();
    match spec.kind {
        PromptKind::Text => {
            if input.is_empty() {
                None
            } else {
                Some(PromptResult::Text {
                    value: input.to_string(),
                })
            }
        }
        PromptKind::Choice => parse_choice(&spec.choices, input),
        PromptKind::Confirm => parse_confirm(input).map(|value| PromptResult::Confirm { value }),
    }
}

/// Message sent when a reply cannot be parsed: a short nudge plus the
/// original prompt again.
pub fn retry(spec: &PromptSpec) -> String {
    let lead = match spec.kind {
        PromptKind::Text => "Please enter a reply.",
        PromptKind::Choice => "Please pick one of the listed options.",
        PromptKind::Confirm => "Please answer Yes or No.",
    };
    format!("{lead}\n\n{}", render(spec))
}

/// Accepts the option number ("1", "2", ...) or the option label
/// case-insensitively.
fn parse_choice(choices: &[String], input: &str) -> Option<PromptResult> {
    if let Ok(n) = input.parse::<usize>() {
        if (1..=choices.len()).contains(&n) {
            return choices.get(n - 1).map(|value| PromptResult::Choice {
                index: n - 1,
                value: value.clone(),
            });
        }
    }

    choices
        .iter()
        .position(|c| c.eq_ignore_ascii_case(input))
        .and_then(|index| {
            choices.get(index).map(|value| PromptResult::Choice {
                index,
                value: value.clone(),
            })
        })
}

fn parse_confirm(input: &str) -> Option<bool> {
    let normalized = input
        .trim_end_matches(['.', '!'])
        .trim()
        .to_ascii_lowercase();
    match normalized.as_str() {
        "yes" | "y" | "yep" | "yeah" | "sure" | "true" | "1" => Some(true),
        "no" | "n" | "nope" | "false" | "2" => Some(false),
        _ => None,
    }
}
