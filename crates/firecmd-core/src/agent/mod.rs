//! Agent execution.
//!
//! - `AgentContext`: system prompt, conversation messages and agent state
//! - `Agent`: the sequential model/tool loop, streamed as `AgentEvent`s
//! - `AgentFactory`: assembles an agent with prompt, tools and memory hooks
//! - `prompt`: fixed system prompts for the main agent and the news sub-agent

pub mod context;
pub mod engine;
pub mod factory;
pub mod prompt;
