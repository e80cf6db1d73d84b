//! Agent invocation types.
//!
//! `Invocation` is the payload exchanged between the gateway and the agent
//! runtime; `AgentEvent` is the unit the runtime streams back.

use serde::{Deserialize, Serialize};

use crate::llm::StopReason;

/// Static configuration of one agent instance.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Display name used in logs and spans.
    pub name: String,
    /// Model identifier passed to the provider.
    pub model: String,
    /// Base system prompt before any hook appends context.
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    /// Upper bound on model/tool iterations per invocation.
    pub max_tool_rounds: u32,
}

/// Mutable per-agent state visible to hooks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentState {
    pub actor_id: Option<String>,
    pub session_id: Option<String>,
}

impl AgentState {
    pub fn new(actor_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            actor_id: Some(actor_id.into()),
            session_id: Some(session_id.into()),
        }
    }
}

/// Incoming invocation with every field optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Values substituted for absent invocation fields.
#[derive(Debug, Clone, Copy)]
pub struct InvocationDefaults {
    pub prompt: &'static str,
    pub actor_id: &'static str,
    pub session_id: &'static str,
}

impl InvocationDefaults {
    /// Defaults applied by the HTTP gateway.
    pub const GATEWAY: InvocationDefaults = InvocationDefaults {
        prompt: "",
        actor_id: "default-user",
        session_id: "default-session",
    };

    /// Defaults applied by the agent runtime entrypoint.
    pub const RUNTIME: InvocationDefaults = InvocationDefaults {
        prompt: "Hello! How can I assist you?",
        actor_id: "default-user1",
        session_id: "default-session1",
    };
}

impl InvocationRequest {
    /// Fill absent fields from `defaults`.
    pub fn resolve(self, defaults: InvocationDefaults) -> Invocation {
        Invocation {
            prompt: self.prompt.unwrap_or_else(|| defaults.prompt.to_string()),
            actor_id: self
                .actor_id
                .unwrap_or_else(|| defaults.actor_id.to_string()),
            session_id: self
                .session_id
                .unwrap_or_else(|| defaults.session_id.to_string()),
        }
    }
}

/// Fully resolved invocation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub prompt: String,
    pub actor_id: String,
    pub session_id: String,
}

/// Events streamed by the agent runtime.
///
/// Text events serialize as `{"event":"text","data":"..."}` so the gateway
/// can pick out the `data` field without knowing the other variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    Text {
        data: String,
    },
    ToolStart {
        tool_use_id: String,
        name: String,
    },
    ToolEnd {
        tool_use_id: String,
        name: String,
        is_error: bool,
    },
    Complete {
        stop_reason: Option<StopReason>,
        rounds: u32,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_defaults_fill_missing_fields() {
        let req: InvocationRequest = serde_json::from_str(r#"{"prompt":"화재"}"#).unwrap();
        let inv = req.resolve(InvocationDefaults::GATEWAY);
        assert_eq!(inv.prompt, "화재");
        assert_eq!(inv.actor_id, "default-user");
        assert_eq!(inv.session_id, "default-session");
    }

    #[test]
    fn test_runtime_defaults_fill_empty_payload() {
        let req: InvocationRequest = serde_json::from_str("{}").unwrap();
        let inv = req.resolve(InvocationDefaults::RUNTIME);
        assert_eq!(inv.prompt, "Hello! How can I assist you?");
        assert_eq!(inv.actor_id, "default-user1");
        assert_eq!(inv.session_id, "default-session1");
    }

    #[test]
    fn test_text_event_carries_data_key() {
        let ev = AgentEvent::Text {
            data: "안녕하세요".to_string(),
        };
        let value = serde_json::to_value(&ev).unwrap();
        assert_eq!(value["event"], "text");
        assert_eq!(value["data"], "안녕하세요");
    }

    #[test]
    fn test_tool_events_have_no_data_key() {
        let ev = AgentEvent::ToolStart {
            tool_use_id: "t1".to_string(),
            name: "wikipedia".to_string(),
        };
        let value = serde_json::to_value(&ev).unwrap();
        assert!(value.get("data").is_none());
    }
}
