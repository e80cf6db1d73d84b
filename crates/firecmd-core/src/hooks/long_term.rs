//! Long-term memory hook.
//!
//! Splices records retrieved from the actor's namespace into each new user
//! message and, once the invocation finishes, persists the final
//! (user, assistant) exchange as one event.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use firecmd_types::llm::{Message, MessageRole};
use firecmd_types::memory::{ConversationTurn, SessionKey};

use crate::agent::context::AgentContext;
use crate::memory::box_store::BoxMemoryStore;
use crate::memory::session::actor_namespace;

use super::HookProvider;

/// Separator between a user's text and the retrieved context.
pub const PREVIOUS_CONTEXT_MARKER: &str = "\n\nPrevious context: ";

pub struct LongTermMemoryHook {
    store: Arc<BoxMemoryStore>,
    top_k: usize,
}

impl LongTermMemoryHook {
    pub fn new(store: Arc<BoxMemoryStore>, top_k: usize) -> Self {
        Self { store, top_k }
    }
}

/// Pick the exchange to persist: the last assistant message with text, and
/// the nearest user message before it that is not a tool result.
///
/// Any context spliced into the user text is dropped.
pub fn select_turn_pair(messages: &[Message]) -> Option<(String, String)> {
    let (assistant_idx, assistant_text) = messages
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, m)| m.role == MessageRole::Assistant)
        .map(|(i, m)| (i, m.text()))
        .find(|(_, text)| !text.is_empty())?;

    let user_text = messages[..assistant_idx]
        .iter()
        .rev()
        .find(|m| m.role == MessageRole::User && !m.is_tool_result())
        .map(Message::text)?;

    let user_text = match user_text.split_once(PREVIOUS_CONTEXT_MARKER) {
        Some((own, _)) => own.to_string(),
        None => user_text,
    };
    if user_text.is_empty() {
        return None;
    }
    Some((user_text, assistant_text))
}

#[async_trait]
impl HookProvider for LongTermMemoryHook {
    fn name(&self) -> &str {
        "long_term_memory"
    }

    async fn on_message_added(&self, ctx: &mut AgentContext) {
        let query = match ctx.last_message() {
            Some(m) if m.role == MessageRole::User && !m.is_tool_result() => {
                match m.first_text() {
                    Some(text) => text.to_string(),
                    None => return,
                }
            }
            _ => return,
        };
        let Some(actor_id) = ctx.state.actor_id.clone() else {
            warn!("actor_id missing, skipping memory retrieval");
            return;
        };

        let namespace = actor_namespace(&actor_id);
        let records = match self.store.retrieve(&namespace, &query, self.top_k).await {
            Ok(records) => records,
            Err(e) => {
                warn!(%namespace, error = %e, "Memory retrieval failed");
                return;
            }
        };

        let texts: Vec<&str> = records
            .iter()
            .map(|r| r.text.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if texts.is_empty() {
            debug!(%namespace, "No long-term memories matched");
            return;
        }

        if let Some(text) = ctx.last_message_mut().and_then(Message::first_text_mut) {
            text.push_str(PREVIOUS_CONTEXT_MARKER);
            text.push_str(&texts.join("\n"));
            info!(%namespace, count = texts.len(), "Long-term memories spliced into message");
        }
    }

    async fn after_invocation(&self, ctx: &mut AgentContext) {
        if ctx.messages.len() < 2 || !ctx.ends_with_assistant() {
            return;
        }
        let Some((user_text, assistant_text)) = select_turn_pair(&ctx.messages) else {
            return;
        };
        let (Some(actor_id), Some(session_id)) = (&ctx.state.actor_id, &ctx.state.session_id)
        else {
            warn!("actor_id or session_id missing, skipping long-term save");
            return;
        };

        let key = SessionKey::new(actor_id.as_str(), session_id.as_str());
        let turns = [
            ConversationTurn::user(user_text),
            ConversationTurn::assistant(assistant_text),
        ];
        match self.store.create_event(&key, &turns).await {
            Ok(event_id) => info!(session = %key, %event_id, "Exchange saved to long-term memory"),
            Err(e) => warn!(session = %key, error = %e, "Long-term save failed"),
        }
    }
}
