//! Session runtime executor

use super::traits::Storage;
use super::SseEvent;

use crate::dialog::{transition, DialogState, Effect, Event, SessionContext};
use serde_json::Value;
use tokio::sync::{broadcast, mpsc};

/// Generic session runtime that can work with any storage implementation
pub struct SessionRuntime<S>
where
    S: Storage + Clone + 'static,
{
    context: SessionContext,
    state: DialogState,
    storage: S,
    event_rx: mpsc::Receiver<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
}

impl<S> SessionRuntime<S>
where
    S: Storage + Clone + 'static,
{
    pub fn new(
        context: SessionContext,
        state: DialogState,
        storage: S,
        event_rx: mpsc::Receiver<Event>,
        broadcast_tx: broadcast::Sender<SseEvent>,
    ) -> Self {
        Self {
            context,
            state,
            storage,
            event_rx,
            broadcast_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting session runtime");

        loop {
            tokio::select! {
                Some(event) = self.event_rx.recv() => {
                    if let Err(e) = self.process_event(event).await {
                        tracing::error!(
                            session_id = %self.context.session_id,
                            error = %e,
                            "Error processing event"
                        );
                        let _ = self.broadcast_tx.send(SseEvent::Error { message: e });
                    }
                }
                else => break,
            }
        }

        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    async fn process_event(&mut self, event: Event) -> Result<(), String> {
        tracing::debug!(
            session_id = %self.context.session_id,
            state = ?self.state,
            event = ?event,
            "Processing event"
        );

        let result =
            transition(&self.state, &self.context, event).map_err(|e| e.to_string())?;

        self.state = result.new_state;

        for effect in result.effects {
            self.execute_effect(effect).await?;
        }

        Ok(())
    }

    async fn execute_effect(&mut self, effect: Effect) -> Result<(), String> {
        match effect {
            Effect::RecordTurn { sender, body } => {
                let turn = self
                    .storage
                    .add_turn(&self.context.session_id, sender, &body)
                    .await?;

                let _ = self.broadcast_tx.send(SseEvent::Turn {
                    turn: serde_json::to_value(&turn).unwrap_or(Value::Null),
                });
                Ok(())
            }

            Effect::PersistState => {
                self.storage
                    .update_state(&self.context.session_id, &self.state)
                    .await?;

                let _ = self.broadcast_tx.send(SseEvent::StateChange {
                    state: serde_json::to_value(&self.state).unwrap_or(Value::Null),
                });
                Ok(())
            }

            Effect::SaveProfile { intent, client } => {
                let profile = self
                    .storage
                    .add_profile(&self.context.session_id, intent, client.as_deref())
                    .await?;

                tracing::info!(
                    session_id = %self.context.session_id,
                    intent = %profile.intent,
                    "Saved profile for completed dialog"
                );
                Ok(())
            }

            Effect::NotifyEnded => {
                let _ = self.broadcast_tx.send(SseEvent::DialogEnded);
                Ok(())
            }
        }
    }
}
