//! Per-invocation agent assembly.

use std::sync::Arc;

use tracing::info;

use firecmd_types::agent::{AgentConfig, AgentState};
use firecmd_types::config::{AgentSettings, MemorySettings};
use firecmd_types::event::EventEncoding;

use crate::hooks::HookProvider;
use crate::hooks::long_term::LongTermMemoryHook;
use crate::hooks::short_term::ShortTermMemoryHook;
use crate::llm::box_provider::BoxLlmProvider;
use crate::memory::session::MemorySessionManager;
use crate::tool::ToolRegistry;

use super::engine::Agent;
use super::prompt::agent_system_prompt;

/// Builds a fresh agent for every `(actor_id, session_id)` invocation.
///
/// Provider, tools and the memory session manager are shared; prompt
/// context and hooks are per agent.
pub struct AgentFactory {
    template: AgentConfig,
    provider: Arc<BoxLlmProvider>,
    sessions: Arc<MemorySessionManager>,
    tools: Arc<ToolRegistry>,
    recent_turns: usize,
    retrieve_top_k: usize,
}

impl AgentFactory {
    pub fn new(
        agent: &AgentSettings,
        memory: &MemorySettings,
        encoding: EventEncoding,
        provider: Arc<BoxLlmProvider>,
        sessions: Arc<MemorySessionManager>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            template: AgentConfig {
                name: agent.name.clone(),
                model: agent.model_id.clone(),
                system_prompt: agent_system_prompt(encoding),
                max_tokens: agent.max_tokens,
                temperature: agent.temperature,
                max_tool_rounds: agent.max_tool_rounds,
            },
            provider,
            sessions,
            tools,
            recent_turns: memory.recent_turns,
            retrieve_top_k: memory.retrieve_top_k,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn agent_name(&self) -> &str {
        &self.template.name
    }

    /// Assemble and initialize an agent bound to one memory session.
    ///
    /// Hooks run in registration order: short-term memory first, so the raw
    /// user text is persisted before long-term context is spliced in.
    pub async fn create_agent(&self, actor_id: &str, session_id: &str) -> Agent {
        let session = self.sessions.create_memory_session(actor_id, session_id);
        let hooks: Vec<Arc<dyn HookProvider>> = vec![
            Arc::new(ShortTermMemoryHook::new(session, self.recent_turns)),
            Arc::new(LongTermMemoryHook::new(
                Arc::clone(self.sessions.store()),
                self.retrieve_top_k,
            )),
        ];

        let mut agent = Agent::new(
            self.template.clone(),
            Arc::clone(&self.provider),
            Arc::clone(&self.tools),
            hooks,
            AgentState::new(actor_id, session_id),
        );
        agent.initialize().await;
        info!(
            agent = %self.template.name,
            actor_id,
            session_id,
            tools = ?self.tools.names(),
            "Agent created"
        );
        agent
    }
}
