//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ErrorResponse, MessageRequest, MessageResponse, RenameRequest, SessionListResponse,
    SessionResponse, SessionWithTurnsResponse, SuccessResponse,
};
use super::AppState;
use crate::dialog::Event;
use crate::runtime::SseEvent;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Datelike;
use chrono::{Local, Timelike};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::Value;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Session listing
        .route("/api/sessions", get(list_sessions))
        // Session creation
        .route("/api/sessions/new", post(create_session))
        // Session retrieval
        .route("/api/sessions/:id", get(get_session))
        // SSE streaming
        .route("/api/sessions/:id/stream", get(stream_session))
        // User actions
        .route("/api/sessions/:id/message", post(send_message))
        .route("/api/sessions/:id/reset", post(reset_session))
        // Lifecycle
        .route("/api/sessions/:id/delete", post(delete_session))
        .route("/api/sessions/:id/rename", post(rename_session))
        // Slug resolution
        .route("/api/sessions/by-slug/:slug", get(get_by_slug))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Session Listing
// ============================================================

async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = state
        .sessions
        .db()
        .list_sessions()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let json_sessions: Vec<Value> = sessions
        .into_iter()
        .map(|s| serde_json::to_value(s).unwrap_or(Value::Null))
        .collect();

    Ok(Json(SessionListResponse {
        sessions: json_sessions,
    }))
}

// ============================================================
// Session Creation
// ============================================================

async fn create_session(
    State(state): State<AppState>,
) -> Result<Json<SessionResponse>, AppError> {
    // Generate ID and slug
    let id = uuid::Uuid::new_v4().to_string();
    let slug = generate_slug();

    let session = state
        .sessions
        .db()
        .create_session(&id, &slug)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(SessionResponse {
        session: serde_json::to_value(session).unwrap_or(Value::Null),
    }))
}

// ============================================================
// Session Retrieval
// ============================================================

#[derive(Debug, Deserialize)]
struct GetSessionQuery {
    after_sequence: Option<i64>,
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<GetSessionQuery>,
) -> Result<Json<SessionWithTurnsResponse>, AppError> {
    let session = state
        .sessions
        .db()
        .get_session(&id)
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    let turns = if let Some(after) = query.after_sequence {
        state.sessions.db().get_turns_after(&id, after)
    } else {
        state.sessions.db().get_turns(&id)
    }
    .map_err(|e| AppError::Internal(e.to_string()))?;

    let json_turns: Vec<Value> = turns
        .iter()
        .map(|t| serde_json::to_value(t).unwrap_or(Value::Null))
        .collect();

    let profiles = state
        .sessions
        .db()
        .get_profiles(&id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let json_profiles: Vec<Value> = profiles
        .iter()
        .map(|p| serde_json::to_value(p).unwrap_or(Value::Null))
        .collect();

    Ok(Json(SessionWithTurnsResponse {
        session: serde_json::to_value(&session).unwrap_or(Value::Null),
        turns: json_turns,
        profiles: json_profiles,
        dialog_active: session.is_active(),
    }))
}

// ============================================================
// SSE Streaming
// ============================================================

#[derive(Debug, Deserialize)]
struct StreamQuery {
    after: Option<i64>,
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<StreamQuery>,
) -> Result<impl IntoResponse, AppError> {
    let session = state
        .sessions
        .db()
        .get_session(&id)
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    // Get turns (filtered by after if provided)
    let turns = if let Some(after) = query.after {
        state.sessions.db().get_turns_after(&id, after)
    } else {
        state.sessions.db().get_turns(&id)
    }
    .map_err(|e| AppError::Internal(e.to_string()))?;

    let last_sequence_id = state.sessions.db().get_last_sequence_id(&id).unwrap_or(0);

    let json_turns: Vec<Value> = turns
        .iter()
        .map(|t| serde_json::to_value(t).unwrap_or(Value::Null))
        .collect();

    // Subscribe to updates
    let broadcast_rx = state
        .sessions
        .subscribe(&id)
        .await
        .map_err(AppError::Internal)?;

    // Create init event
    let init_event = SseEvent::Init {
        session: serde_json::to_value(&session).unwrap_or(Value::Null),
        turns: json_turns,
        dialog_active: session.is_active(),
        last_sequence_id,
    };

    Ok(sse_stream(init_event, broadcast_rx))
}

// ============================================================
// User Actions
// ============================================================

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    // Send event to runtime
    let event = Event::UserTurn { text: req.text };

    state
        .sessions
        .send_event(&id, event)
        .await
        .map_err(AppError::BadRequest)?;

    Ok(Json(MessageResponse { queued: true }))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state
        .sessions
        .send_event(&id, Event::Reset)
        .await
        .map_err(AppError::BadRequest)?;

    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Lifecycle
// ============================================================

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    // Stop the runtime before dropping its rows
    state.sessions.remove(&id).await;

    state
        .sessions
        .db()
        .delete_session(&id)
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    Ok(Json(SuccessResponse { success: true }))
}

async fn rename_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RenameRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    state
        .sessions
        .db()
        .rename_session(&id, &req.slug)
        .map_err(|e| match e {
            crate::db::DbError::SlugExists(_) => {
                AppError::BadRequest("Slug already exists".to_string())
            }
            _ => AppError::NotFound(e.to_string()),
        })?;

    let session = state
        .sessions
        .db()
        .get_session(&id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(SessionResponse {
        session: serde_json::to_value(session).unwrap_or(Value::Null),
    }))
}

// ============================================================
// Slug Resolution
// ============================================================

async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<SessionWithTurnsResponse>, AppError> {
    let session = state
        .sessions
        .db()
        .get_session_by_slug(&slug)
        .map_err(|e| AppError::NotFound(e.to_string()))?;

    let turns = state
        .sessions
        .db()
        .get_turns(&session.id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let json_turns: Vec<Value> = turns
        .iter()
        .map(|t| serde_json::to_value(t).unwrap_or(Value::Null))
        .collect();

    let profiles = state
        .sessions
        .db()
        .get_profiles(&session.id)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let json_profiles: Vec<Value> = profiles
        .iter()
        .map(|p| serde_json::to_value(p).unwrap_or(Value::Null))
        .collect();

    Ok(Json(SessionWithTurnsResponse {
        session: serde_json::to_value(&session).unwrap_or(Value::Null),
        turns: json_turns,
        profiles: json_profiles,
        dialog_active: session.is_active(),
    }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("railbot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Slug Generation
// ============================================================

fn generate_slug() -> String {
    let now = Local::now();

    // Day of week
    let day = match now.weekday() {
        chrono::Weekday::Mon => "monday",
        chrono::Weekday::Tue => "tuesday",
        chrono::Weekday::Wed => "wednesday",
        chrono::Weekday::Thu => "thursday",
        chrono::Weekday::Fri => "friday",
        chrono::Weekday::Sat => "saturday",
        chrono::Weekday::Sun => "sunday",
    };

    // Time of day
    let time = match now.hour() {
        6..=11 => "morning",
        12..=16 => "afternoon",
        17..=20 => "evening",
        _ => "night",
    };

    // Random words
    let words = &[
        "signal", "junction", "harbor", "summit", "meadow", "lantern", "compass", "bridge",
        "canyon", "orchard", "willow", "ember", "garnet", "cobalt", "amber", "slate", "quiet",
        "swift", "steady", "bright", "copper", "cedar", "maple", "wren", "heron", "otter",
        "badger", "linnet", "drift", "spark", "frost", "tide",
    ];

    let mut rng = rand::thread_rng();
    let adjective = words.choose(&mut rng).unwrap_or(&"blue");
    let noun = words.choose(&mut rng).unwrap_or(&"sky");

    format!("{day}-{time}-{adjective}-{noun}")
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
