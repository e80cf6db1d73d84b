//! Agent conversation context.
//!
//! AgentContext is the mutable state hooks operate on: the assembled system
//! prompt, the running message list, and the agent state carrying the
//! session identifiers.

use firecmd_types::agent::AgentState;
use firecmd_types::llm::{Message, MessageRole};

#[derive(Debug, Clone)]
pub struct AgentContext {
    /// Base prompt plus anything hooks appended at initialization.
    pub system_prompt: String,
    /// Running conversation (user, assistant and tool-result messages).
    pub messages: Vec<Message>,
    pub state: AgentState,
}

impl AgentContext {
    pub fn new(system_prompt: impl Into<String>, state: AgentState) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
            state,
        }
    }

    /// The most recently added message.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn last_message_mut(&mut self) -> Option<&mut Message> {
        self.messages.last_mut()
    }

    /// Whether the conversation currently ends with an assistant message.
    pub fn ends_with_assistant(&self) -> bool {
        self.messages
            .last()
            .is_some_and(|m| m.role == MessageRole::Assistant)
    }
}
