//! Memory sessions and turn grouping.

use std::sync::Arc;

use tracing::debug;

use firecmd_types::error::StoreError;
use firecmd_types::memory::{ConversationTurn, SessionKey, StoredEvent, TurnRole};

use super::box_store::BoxMemoryStore;

/// Events fetched when rebuilding recent turns.
pub const LIST_EVENTS_LIMIT: usize = 100;

/// Namespace holding an actor's long-term records.
pub fn actor_namespace(actor_id: &str) -> String {
    format!("/actors/{actor_id}")
}

/// Split stored events into turn groups.
///
/// A group starts at a user turn and runs until the next user turn. Turns
/// preceding the first user turn form a group of their own.
pub fn group_turns(events: &[StoredEvent]) -> Vec<Vec<ConversationTurn>> {
    let mut groups = Vec::new();
    let mut current: Vec<ConversationTurn> = Vec::new();

    for turn in events.iter().flat_map(|e| e.turns.iter()) {
        if turn.role == TurnRole::User && !current.is_empty() {
            groups.push(std::mem::take(&mut current));
        }
        current.push(turn.clone());
    }
    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// The last `k` turn groups, oldest first.
pub fn last_k_turns(events: &[StoredEvent], k: usize) -> Vec<Vec<ConversationTurn>> {
    let mut groups = group_turns(events);
    let skip = groups.len().saturating_sub(k);
    groups.drain(..skip);
    groups
}

/// Render turn groups as the system prompt suffix, or `None` when empty.
pub fn render_recent_conversation(groups: &[Vec<ConversationTurn>]) -> Option<String> {
    let lines: Vec<String> = groups
        .iter()
        .flatten()
        .map(|turn| format!("{}: {}", turn.role, turn.text))
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(format!("\n\nRecent conversation:\n{}", lines.join("\n")))
}

/// Hands out memory sessions over one shared store.
///
/// Constructed once at startup and injected into the agent factory.
pub struct MemorySessionManager {
    store: Arc<BoxMemoryStore>,
}

impl MemorySessionManager {
    pub fn new(store: Arc<BoxMemoryStore>) -> Self {
        Self { store }
    }

    /// The underlying store, for callers that work across sessions.
    pub fn store(&self) -> &Arc<BoxMemoryStore> {
        &self.store
    }

    /// Bind a session to `(actor_id, session_id)`. No identifier validation.
    pub fn create_memory_session(&self, actor_id: &str, session_id: &str) -> MemorySession {
        debug!(actor_id, session_id, "Memory session created");
        MemorySession {
            store: Arc::clone(&self.store),
            key: SessionKey::new(actor_id, session_id),
        }
    }
}

/// A memory store bound to one session key.
#[derive(Clone)]
pub struct MemorySession {
    store: Arc<BoxMemoryStore>,
    key: SessionKey,
}

impl MemorySession {
    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    /// Persist turns as one event. Returns the event id.
    pub async fn add_turns(&self, turns: &[ConversationTurn]) -> Result<String, StoreError> {
        self.store.create_event(&self.key, turns).await
    }

    /// The session's last `k` turn groups, oldest first.
    pub async fn get_last_k_turns(
        &self,
        k: usize,
    ) -> Result<Vec<Vec<ConversationTurn>>, StoreError> {
        let events = self.store.list_events(&self.key, LIST_EVENTS_LIMIT).await?;
        Ok(last_k_turns(&events, k))
    }
}
