//! Agent lifecycle hooks.
//!
//! The agent calls every registered provider, in registration order, at
//! three points: once after construction (`on_agent_initialized`), after
//! each message is appended (`on_message_added`) and once when an
//! invocation finishes (`after_invocation`). Hooks may mutate the context.
//! They must not fail: errors are logged inside the hook and swallowed.

pub mod long_term;
pub mod short_term;

use async_trait::async_trait;

use crate::agent::context::AgentContext;

#[async_trait]
pub trait HookProvider: Send + Sync {
    /// Name used in log fields.
    fn name(&self) -> &str;

    async fn on_agent_initialized(&self, _ctx: &mut AgentContext) {}

    async fn on_message_added(&self, _ctx: &mut AgentContext) {}

    async fn after_invocation(&self, _ctx: &mut AgentContext) {}
}
