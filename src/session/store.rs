//! Conversation store: one state slot per conversation, created on first access.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::state::{ConversationId, ConversationState};

/// Handle to one conversation's state. Hold the guard for the duration of a
/// handler so overlapping events for the same conversation cannot interleave.
pub type SharedState = Arc<Mutex<ConversationState>>;

/// Result of a non-blocking state lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// The conversation has never been seen.
    Unknown,
    /// A handler currently holds the conversation.
    Busy,
    Ready(ConversationState),
}

/// Process-wide map of conversation state. Entries are never evicted.
#[derive(Default)]
pub struct ConversationStore {
    sessions: RwLock<HashMap<ConversationId, SharedState>>,
}

impl ConversationStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Return the state for `id`, creating an idle record if none exists.
    pub async fn get_or_create(&self, id: &ConversationId) -> SharedState {
        if let Some(state) = self.sessions.read().await.get(id) {
            return Arc::clone(state);
        }

        let mut sessions = self.sessions.write().await;
        let state = sessions.entry(id.clone()).or_insert_with(|| {
            tracing::debug!(conversation_id = %id, "Creating conversation state");
            Arc::new(Mutex::new(ConversationState::default()))
        });
        Arc::clone(state)
    }

    /// Reset `id` to the idle default.
    ///
    /// Locks the conversation, so it must not be called while the caller
    /// already holds that conversation's guard.
    pub async fn reset(&self, id: &ConversationId) {
        let state = self.get_or_create(id).await;
        state.lock().await.reset();
    }

    /// Copy of the current state, without creating one.
    pub async fn snapshot(&self, id: &ConversationId) -> Option<ConversationState> {
        let state = self.sessions.read().await.get(id).cloned()?;
        let guard = state.lock().await;
        Some(guard.clone())
    }

    /// Copy of the current state without waiting on a handler in progress.
    /// Never creates state.
    pub async fn try_snapshot(&self, id: &ConversationId) -> Snapshot {
        let Some(state) = self.sessions.read().await.get(id).cloned() else {
            return Snapshot::Unknown;
        };
        match state.try_lock() {
            Ok(guard) => Snapshot::Ready(guard.clone()),
            Err(_) => Snapshot::Busy,
        }
    }

    /// Number of conversations seen since startup.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
