//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::db::{Profile, Sender, Turn};
use crate::dialog::{DialogState, Intent};
use async_trait::async_trait;

/// Storage for conversation transcripts
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Append a turn to the session transcript
    async fn add_turn(&self, session_id: &str, sender: Sender, body: &str)
        -> Result<Turn, String>;

    /// Get all turns for a session
    #[allow(dead_code)] // Used in tests
    async fn get_turns(&self, session_id: &str) -> Result<Vec<Turn>, String>;
}

/// Storage for dialog state
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Update the dialog state (full state as JSON)
    async fn update_state(&self, session_id: &str, state: &DialogState) -> Result<(), String>;

    /// Get the current dialog state
    #[allow(dead_code)] // API completeness
    async fn get_state(&self, session_id: &str) -> Result<DialogState, String>;
}

/// Storage for user profiles captured by completed dialogs
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Record the profile a finished waterfall collected
    async fn add_profile(
        &self,
        session_id: &str,
        intent: Intent,
        client: Option<&str>,
    ) -> Result<Profile, String>;

    /// Get all profiles for a session
    #[allow(dead_code)] // Used in tests
    async fn get_profiles(&self, session_id: &str) -> Result<Vec<Profile>, String>;
}

/// Combined storage trait for convenience
pub trait Storage: TranscriptStore + StateStore + ProfileStore {}
impl<T: TranscriptStore + StateStore + ProfileStore> Storage for T {}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: TranscriptStore + ?Sized> TranscriptStore for Arc<T> {
    async fn add_turn(
        &self,
        session_id: &str,
        sender: Sender,
        body: &str,
    ) -> Result<Turn, String> {
        (**self).add_turn(session_id, sender, body).await
    }

    async fn get_turns(&self, session_id: &str) -> Result<Vec<Turn>, String> {
        (**self).get_turns(session_id).await
    }
}

#[async_trait]
impl<T: StateStore + ?Sized> StateStore for Arc<T> {
    async fn update_state(&self, session_id: &str, state: &DialogState) -> Result<(), String> {
        (**self).update_state(session_id, state).await
    }

    async fn get_state(&self, session_id: &str) -> Result<DialogState, String> {
        (**self).get_state(session_id).await
    }
}

#[async_trait]
impl<T: ProfileStore + ?Sized> ProfileStore for Arc<T> {
    async fn add_profile(
        &self,
        session_id: &str,
        intent: Intent,
        client: Option<&str>,
    ) -> Result<Profile, String> {
        (**self).add_profile(session_id, intent, client).await
    }

    async fn get_profiles(&self, session_id: &str) -> Result<Vec<Profile>, String> {
        (**self).get_profiles(session_id).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

use crate::db::Database;
use std::sync::Arc;

/// Adapter to use Database as Storage
#[derive(Clone)]
pub struct DatabaseStorage {
    db: Database,
}

impl DatabaseStorage {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[allow(dead_code)] // Useful for tests
    pub fn inner(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl TranscriptStore for DatabaseStorage {
    async fn add_turn(
        &self,
        session_id: &str,
        sender: Sender,
        body: &str,
    ) -> Result<Turn, String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.db
            .add_turn(&id, session_id, sender, body)
            .map_err(|e| e.to_string())
    }

    async fn get_turns(&self, session_id: &str) -> Result<Vec<Turn>, String> {
        self.db.get_turns(session_id).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl StateStore for DatabaseStorage {
    async fn update_state(&self, session_id: &str, state: &DialogState) -> Result<(), String> {
        self.db
            .update_session_state(session_id, state)
            .map_err(|e| e.to_string())
    }

    async fn get_state(&self, session_id: &str) -> Result<DialogState, String> {
        let session = self.db.get_session(session_id).map_err(|e| e.to_string())?;
        Ok(session.state)
    }
}

#[async_trait]
impl ProfileStore for DatabaseStorage {
    async fn add_profile(
        &self,
        session_id: &str,
        intent: Intent,
        client: Option<&str>,
    ) -> Result<Profile, String> {
        let id = uuid::Uuid::new_v4().to_string();
        self.db
            .add_profile(&id, session_id, intent, client)
            .map_err(|e| e.to_string())
    }

    async fn get_profiles(&self, session_id: &str) -> Result<Vec<Profile>, String> {
        self.db.get_profiles(session_id).map_err(|e| e.to_string())
    }
}
