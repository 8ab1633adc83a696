//! Mock implementations for testing
//!
//! These mocks enable integration testing the runtime without real I/O.

use super::traits::{ProfileStore, StateStore, TranscriptStore};
use crate::db::{Profile, Sender, Turn};
use crate::dialog::{DialogState, Intent};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ============================================================================
// In-Memory Storage
// ============================================================================

/// In-memory storage for testing
#[allow(dead_code)]
pub struct InMemoryStorage {
    turns: Mutex<HashMap<String, Vec<Turn>>>,
    states: Mutex<HashMap<String, DialogState>>,
    profiles: Mutex<HashMap<String, Vec<Profile>>>,
    next_seq: Mutex<i64>,
}

#[allow(dead_code)]
impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            turns: Mutex::new(HashMap::new()),
            states: Mutex::new(HashMap::new()),
            profiles: Mutex::new(HashMap::new()),
            next_seq: Mutex::new(1),
        }
    }

    /// Get all turns for a session
    pub fn get_all_turns(&self, session_id: &str) -> Vec<Turn> {
        self.turns
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Get current state for a session
    pub fn get_current_state(&self, session_id: &str) -> Option<DialogState> {
        self.states.lock().unwrap().get(session_id).cloned()
    }

    /// Get all profiles for a session
    pub fn get_all_profiles(&self, session_id: &str) -> Vec<Profile> {
        self.profiles
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryStorage {
    async fn add_turn(
        &self,
        session_id: &str,
        sender: Sender,
        body: &str,
    ) -> Result<Turn, String> {
        let mut seq_guard = self.next_seq.lock().unwrap();
        let seq_id = *seq_guard;
        *seq_guard += 1;
        drop(seq_guard);

        let turn = Turn {
            turn_id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            sequence_id: seq_id,
            sender,
            body: body.to_string(),
            created_at: chrono::Utc::now(),
        };

        self.turns
            .lock()
            .unwrap()
            .entry(session_id.to_string())
            .or_default()
            .push(turn.clone());
        Ok(turn)
    }

    async fn get_turns(&self, session_id: &str) -> Result<Vec<Turn>, String> {
        Ok(self.get_all_turns(session_id))
    }
}

#[async_trait]
impl StateStore for InMemoryStorage {
    async fn update_state(&self, session_id: &str, state: &DialogState) -> Result<(), String> {
        self.states
            .lock()
            .unwrap()
            .insert(session_id.to_string(), state.clone());
        Ok(())
    }

    async fn get_state(&self, session_id: &str) -> Result<DialogState, String> {
        Ok(self
            .states
            .lock()
            .unwrap()
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ProfileStore for InMemoryStorage {
    async fn add_profile(
        &self,
        session_id: &str,
        intent: Intent,
        client: Option<&str>,
    ) -> Result<Profile, String> {
        let profile = Profile {
            profile_id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            intent,
            client: client.map(String::from),
            created_at: chrono::Utc::now(),
        };

        self.profiles
            .lock()
            .unwrap()
            .entry(session_id.to_string())
            .or_default()
            .push(profile.clone());
        Ok(profile)
    }

    async fn get_profiles(&self, session_id: &str) -> Result<Vec<Profile>, String> {
        Ok(self.get_all_profiles(session_id))
    }
}

// ============================================================================
// Failing Storage
// ============================================================================

/// Storage that rejects every operation, for error path tests
pub struct FailingStorage;

#[async_trait]
impl TranscriptStore for FailingStorage {
    async fn add_turn(
        &self,
        _session_id: &str,
        _sender: Sender,
        _body: &str,
    ) -> Result<Turn, String> {
        Err("storage offline".to_string())
    }

    async fn get_turns(&self, _session_id: &str) -> Result<Vec<Turn>, String> {
        Err("storage offline".to_string())
    }
}

#[async_trait]
impl StateStore for FailingStorage {
    async fn update_state(&self, _session_id: &str, _state: &DialogState) -> Result<(), String> {
        Err("storage offline".to_string())
    }

    async fn get_state(&self, _session_id: &str) -> Result<DialogState, String> {
        Err("storage offline".to_string())
    }
}

#[async_trait]
impl ProfileStore for FailingStorage {
    async fn add_profile(
        &self,
        _session_id: &str,
        _intent: Intent,
        _client: Option<&str>,
    ) -> Result<Profile, String> {
        Err("storage offline".to_string())
    }

    async fn get_profiles(&self, _session_id: &str) -> Result<Vec<Profile>, String> {
        Err("storage offline".to_string())
    }
}

// ============================================================================
// Test Session Harness
// ============================================================================

use crate::dialog::Event;
use crate::dialog::SessionContext;
use crate::runtime::{SessionRuntime, SseEvent};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};

/// Helper for driving a session runtime with minimal boilerplate
pub struct TestSession {
    pub storage: Arc<InMemoryStorage>,
    pub event_tx: mpsc::Sender<Event>,
    pub broadcast_rx: broadcast::Receiver<SseEvent>,
    _runtime_handle: tokio::task::JoinHandle<()>,
}

impl TestSession {
    /// Spawn a runtime for a brand-new session
    pub fn start() -> Self {
        Self::resume(DialogState::Fresh)
    }

    /// Spawn a runtime that picks up from a stored state
    pub fn resume(state: DialogState) -> Self {
        let storage = Arc::new(InMemoryStorage::new());
        let context = SessionContext::new("test-session");
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, broadcast_rx) = broadcast::channel(128);

        let runtime =
            SessionRuntime::new(context, state, storage.clone(), event_rx, broadcast_tx);

        let handle = tokio::spawn(async move {
            runtime.run().await;
        });

        Self {
            storage,
            event_tx,
            broadcast_rx,
            _runtime_handle: handle,
        }
    }

    /// Send a user reply and collect the bot bodies it produces.
    ///
    /// Returns once the runtime persists the post-turn state, so the
    /// storage assertions that follow never race the executor.
    pub async fn step(&mut self, text: &str) -> Vec<String> {
        self.event_tx
            .send(Event::UserTurn {
                text: text.to_string(),
            })
            .await
            .expect("Failed to send reply");

        let mut bodies = Vec::new();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.broadcast_rx.recv()).await {
                Ok(Ok(SseEvent::Turn { turn })) => {
                    if turn.get("sender").and_then(|v| v.as_str()) == Some("bot") {
                        if let Some(body) = turn.get("body").and_then(|v| v.as_str()) {
                            bodies.push(body.to_string());
                        }
                    }
                }
                Ok(Ok(SseEvent::StateChange { .. })) => return bodies,
                Ok(Ok(_)) => continue,
                _ => continue,
            }
        }
        bodies
    }

    /// Send a reset event
    pub async fn send_reset(&self) {
        self.event_tx
            .send(Event::Reset)
            .await
            .expect("Failed to send reset");
    }

    /// Wait for a state of the given type with timeout
    pub async fn wait_for_state(&mut self, expected_type: &str, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.broadcast_rx.recv()).await {
                Ok(Ok(SseEvent::StateChange { state })) => {
                    if state.get("type").and_then(|v| v.as_str()) == Some(expected_type) {
                        return true;
                    }
                }
                Ok(Ok(_)) => continue,
                _ => continue,
            }
        }
        false
    }

    /// Wait for the dialog-ended notification with timeout
    pub async fn wait_for_ended(&mut self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), self.broadcast_rx.recv()).await {
                Ok(Ok(SseEvent::DialogEnded)) => return true,
                Ok(Ok(_)) => continue,
                _ => continue,
            }
        }
        false
    }

    /// Get the full transcript from storage
    pub fn turns(&self) -> Vec<Turn> {
        self.storage.get_all_turns("test-session")
    }

    /// Get saved profiles from storage
    pub fn profiles(&self) -> Vec<Profile> {
        self.storage.get_all_profiles("test-session")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::{script, SessionValues, Step};
    use crate::prompt;

    #[tokio::test]
    async fn test_in_memory_storage() {
        let storage = InMemoryStorage::new();

        let turn = storage
            .add_turn("session-1", Sender::User, "hello")
            .await
            .unwrap();
        assert_eq!(turn.sequence_id, 1);
        assert_eq!(turn.sender, Sender::User);

        let turn = storage
            .add_turn("session-1", Sender::Bot, "hi there")
            .await
            .unwrap();
        assert_eq!(turn.sequence_id, 2);

        let turns = storage.get_turns("session-1").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].body, "hi there");

        // Unknown sessions read back as fresh
        let state = storage.get_state("session-1").await.unwrap();
        assert_eq!(state, DialogState::Fresh);

        let awaiting = DialogState::AwaitingReply {
            step: Step::Client,
            prompt: script::welcome_prompt(),
            values: SessionValues::default(),
            retries: 0,
        };
        storage.update_state("session-1", &awaiting).await.unwrap();
        assert_eq!(storage.get_state("session-1").await.unwrap(), awaiting);

        let profile = storage
            .add_profile("session-1", Intent::Architecture, Some("Acme"))
            .await
            .unwrap();
        assert_eq!(profile.client.as_deref(), Some("Acme"));
        assert_eq!(storage.get_profiles("session-1").await.unwrap().len(), 1);
    }

    /// Integration test: the architecture branch driven through the runtime
    #[tokio::test]
    async fn test_architecture_dialog_end_to_end() {
        let mut session = TestSession::start();

        let bodies = session.step("hello").await;
        assert_eq!(bodies, vec![prompt::render(&script::welcome_prompt())]);

        session.step("1").await;
        session.step("Acme").await;
        session.step("yes").await;
        let bodies = session.step("yes").await;
        assert_eq!(bodies, vec![script::success_message(Intent::Architecture)]);

        assert!(session.wait_for_ended(Duration::from_secs(2)).await);

        // 5 user turns, 5 bot turns
        let turns = session.turns();
        assert_eq!(turns.len(), 10);
        assert_eq!(turns[0].sender, Sender::User);
        assert_eq!(turns[1].sender, Sender::Bot);

        let profiles = session.profiles();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].intent, Intent::Architecture);
        assert_eq!(profiles[0].client.as_deref(), Some("Acme"));

        assert_eq!(
            session.storage.get_current_state("test-session"),
            Some(DialogState::Fresh)
        );
    }

    /// Integration test: the specification branch driven through the runtime
    #[tokio::test]
    async fn test_specification_dialog_end_to_end() {
        let mut session = TestSession::start();

        session.step("hi").await;
        session.step("2").await;
        session.step("find the EBS requirements").await;
        let bodies = session.step("yes").await;
        assert_eq!(bodies, vec![script::success_message(Intent::Specification)]);

        assert!(session.wait_for_ended(Duration::from_secs(2)).await);

        let profiles = session.profiles();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].intent, Intent::Specification);
        assert_eq!(profiles[0].client, None);
    }

    /// Integration test: declining the architecture summary keeps the dialog open
    #[tokio::test]
    async fn test_declining_summary_keeps_dialog_active() {
        let mut session = TestSession::start();

        session.step("hello").await;
        session.step("1").await;
        session.step("Acme").await;
        let bodies = session.step("no").await;
        assert_eq!(bodies, vec![prompt::render(&script::components_prompt("Acme"))]);

        assert!(session.profiles().is_empty());
        let state = session.storage.get_current_state("test-session");
        assert!(matches!(state, Some(DialogState::AwaitingReply { .. })));
    }

    /// Integration test: a runtime built from a stored state continues the waterfall
    #[tokio::test]
    async fn test_runtime_resumes_stored_waterfall() {
        let stored = DialogState::AwaitingReply {
            step: Step::Lookup,
            prompt: script::client_name_prompt(),
            values: SessionValues {
                intent: Some(Intent::Architecture),
                client: None,
            },
            retries: 0,
        };
        let mut session = TestSession::resume(stored);

        let bodies = session.step("Contoso").await;
        assert_eq!(
            bodies,
            vec![prompt::render(&script::found_architecture_confirm("Contoso"))]
        );
    }

    /// Integration test: reset mid-waterfall lands back on fresh
    #[tokio::test]
    async fn test_reset_returns_runtime_to_fresh() {
        let mut session = TestSession::start();

        session.step("hello").await;
        session.step("1").await;

        session.send_reset().await;
        assert!(session.wait_for_state("fresh", Duration::from_secs(2)).await);
        assert_eq!(
            session.storage.get_current_state("test-session"),
            Some(DialogState::Fresh)
        );
    }

    /// Integration test: storage failures surface as error events
    #[tokio::test]
    async fn test_storage_failure_broadcasts_error() {
        let context = SessionContext::new("test-session");
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, mut broadcast_rx) = broadcast::channel(128);

        let runtime = SessionRuntime::new(
            context,
            DialogState::Fresh,
            Arc::new(FailingStorage),
            event_rx,
            broadcast_tx,
        );
        tokio::spawn(async move { runtime.run().await });

        event_tx
            .send(Event::UserTurn {
                text: "hello".to_string(),
            })
            .await
            .unwrap();

        let mut saw_error = false;
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        while tokio::time::Instant::now() < deadline {
            match tokio::time::timeout(Duration::from_millis(50), broadcast_rx.recv()).await {
                Ok(Ok(SseEvent::Error { message })) => {
                    assert!(message.contains("storage offline"));
                    saw_error = true;
                    break;
                }
                Ok(Ok(_)) => continue,
                _ => continue,
            }
        }
        assert!(saw_error);
    }
}
