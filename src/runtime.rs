//! Runtime for executing dialog sessions
//!
//! Each active session gets a background task that owns its dialog state,
//! feeds incoming events through the pure transition function, and executes
//! the resulting effects against storage. SSE subscribers observe the
//! transcript and state changes through a broadcast channel.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::db::Database;
use crate::dialog::{Event, SessionContext};
use std::collections::HashMap;
use tokio::sync::{broadcast, mpsc, RwLock};

/// Handle to interact with a running session
pub struct SessionHandle {
    pub event_tx: mpsc::Sender<Event>,
    pub broadcast_tx: broadcast::Sender<SseEvent>,
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init {
        session: serde_json::Value,
        turns: Vec<serde_json::Value>,
        dialog_active: bool,
        last_sequence_id: i64,
    },
    Turn {
        turn: serde_json::Value,
    },
    StateChange {
        /// Full state as JSON object (e.g., `{"type":"awaiting_reply","step":"client",...}`)
        state: serde_json::Value,
    },
    DialogEnded,
    Error {
        message: String,
    },
}

/// Manager for all session runtimes
pub struct SessionManager {
    db: Database,
    runtimes: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Get or create a runtime for a session
    pub async fn get_or_create(&self, session_id: &str) -> Result<SessionHandle, String> {
        // Check if already running
        {
            let runtimes = self.runtimes.read().await;
            if let Some(handle) = runtimes.get(session_id) {
                return Ok(SessionHandle {
                    event_tx: handle.event_tx.clone(),
                    broadcast_tx: handle.broadcast_tx.clone(),
                });
            }
        }

        // Need to start a new runtime
        let session = self.db.get_session(session_id).map_err(|e| e.to_string())?;

        let context = SessionContext::new(&session.id);
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);

        let storage = DatabaseStorage::new(self.db.clone());

        // Sessions resume exactly as stored; a restart does not disturb a
        // waterfall awaiting its next reply.
        let runtime = SessionRuntime::new(
            context,
            session.state,
            storage,
            event_rx,
            broadcast_tx.clone(),
        );

        let sid = session_id.to_string();
        tokio::spawn(async move {
            runtime.run().await;
            tracing::info!(session_id = %sid, "Session runtime finished");
        });

        let handle = SessionHandle {
            event_tx: event_tx.clone(),
            broadcast_tx: broadcast_tx.clone(),
        };

        // Store handle
        self.runtimes.write().await.insert(
            session_id.to_string(),
            SessionHandle {
                event_tx,
                broadcast_tx,
            },
        );

        Ok(handle)
    }

    /// Send an event to a session
    pub async fn send_event(&self, session_id: &str, event: Event) -> Result<(), String> {
        let handle = self.get_or_create(session_id).await?;
        handle
            .event_tx
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {e}"))
    }

    /// Subscribe to session updates
    pub async fn subscribe(&self, session_id: &str) -> Result<broadcast::Receiver<SseEvent>, String> {
        let handle = self.get_or_create(session_id).await?;
        Ok(handle.broadcast_tx.subscribe())
    }

    /// Drop a session's runtime if one is running.
    ///
    /// Closing the event channel ends the runtime loop.
    pub async fn remove(&self, session_id: &str) {
        self.runtimes.write().await.remove(session_id);
    }

    /// Get the database handle
    pub fn db(&self) -> &Database {
        &self.db
    }
}
