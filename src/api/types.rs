//! API request and response types

use serde::{Deserialize, Serialize};

/// Request to send a user reply
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// Request to rename a session
#[derive(Debug, Deserialize)]
pub struct RenameRequest {
    pub slug: String,
}

/// Response with a list of sessions
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<serde_json::Value>,
}

/// Response with a single session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: serde_json::Value,
}

/// Response with a session, its transcript, and any saved profiles
#[derive(Debug, Serialize)]
pub struct SessionWithTurnsResponse {
    pub session: serde_json::Value,
    pub turns: Vec<serde_json::Value>,
    pub profiles: Vec<serde_json::Value>,
    pub dialog_active: bool,
}

/// Response for message action
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub queued: bool,
}

/// Response for lifecycle actions
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
