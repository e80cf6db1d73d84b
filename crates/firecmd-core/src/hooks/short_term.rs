//! Short-term memory hook.
//!
//! Loads recent turns into the system prompt when the agent starts and
//! persists every text message as it is added.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use firecmd_types::llm::{ContentBlock, MessageRole};
use firecmd_types::memory::{ConversationTurn, TurnRole};

use crate::agent::context::AgentContext;
use crate::memory::session::{MemorySession, render_recent_conversation};

use super::HookProvider;

pub struct ShortTermMemoryHook {
    session: MemorySession,
    recent_turns: usize,
}

impl ShortTermMemoryHook {
    pub fn new(session: MemorySession, recent_turns: usize) -> Self {
        Self {
            session,
            recent_turns,
        }
    }
}

#[async_trait]
impl HookProvider for ShortTermMemoryHook {
    fn name(&self) -> &str {
        "short_term_memory"
    }

    async fn on_agent_initialized(&self, ctx: &mut AgentContext) {
        match self.session.get_last_k_turns(self.recent_turns).await {
            Ok(groups) => {
                if let Some(context) = render_recent_conversation(&groups) {
                    ctx.system_prompt.push_str(&context);
                    info!(
                        session = %self.session.key(),
                        turns = groups.len(),
                        "Recent conversation loaded"
                    );
                }
            }
            Err(e) => warn!(session = %self.session.key(), error = %e, "Failed to load recent turns"),
        }
    }

    async fn on_message_added(&self, ctx: &mut AgentContext) {
        let Some(message) = ctx.last_message() else {
            return;
        };
        // Tool-use-only and tool-result messages never open with text.
        let Some(ContentBlock::Text { text }) = message.content.first() else {
            return;
        };
        if text.is_empty() {
            return;
        }
        let role = match message.role {
            MessageRole::User => TurnRole::User,
            MessageRole::Assistant => TurnRole::Assistant,
        };
        let turn = ConversationTurn {
            role,
            text: text.clone(),
        };
        match self.session.add_turns(std::slice::from_ref(&turn)).await {
            Ok(event_id) => debug!(%role, %event_id, "Message persisted"),
            Err(e) => warn!(%role, error = %e, "Failed to persist message"),
        }
    }
}
