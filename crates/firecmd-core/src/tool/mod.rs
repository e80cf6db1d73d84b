//! Tool set exposed to the agent.
//!
//! Every tool is a stateless request/response operation. A tool returns
//! `Err(ToolError)` on failure; `ToolRegistry::dispatch` turns that into an
//! error-flagged result text so the model always receives an answer.

pub mod news;
pub mod station;
pub mod weather;
pub mod wiki;

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{info, warn};

use firecmd_types::llm::ToolDefinition;
use firecmd_types::tool::ToolError;

/// Prefix of the result text for a failed tool call.
pub const DEFAULT_ERROR_PREFIX: &str = "오류 발생";

/// Interface for executable tools.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    /// Description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema for the tool arguments.
    fn args_schema(&self) -> Value;

    /// Prefix placed before the error text when the call fails.
    fn error_prefix(&self) -> &str {
        DEFAULT_ERROR_PREFIX
    }

    async fn call(&self, args: Value) -> Result<String, ToolError>;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.args_schema(),
        }
    }
}

/// JSON schema for `T`, without the `$schema` marker.
pub fn schema_of<T: JsonSchema>() -> Value {
    let schema = schemars::schema_for!(T);
    let mut value = serde_json::to_value(&schema).unwrap_or_else(|_| json!({"type": "object"}));
    if let Some(obj) = value.as_object_mut() {
        obj.remove("$schema");
    }
    value
}

/// Deserialize tool arguments.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|e| ToolError::InvalidInput(e.to_string()))
}

/// Result of one dispatched tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
}

/// Ordered set of tools available to an agent.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Definitions for the model request, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Run a tool by name. Never fails: errors become flagged result text.
    pub async fn dispatch(&self, name: &str, args: Value) -> ToolOutcome {
        let Some(tool) = self.get(name) else {
            warn!(tool = name, "Model requested an unknown tool");
            return ToolOutcome {
                content: format!("{DEFAULT_ERROR_PREFIX}: unknown tool '{name}'"),
                is_error: true,
            };
        };

        info!(tool = name, "Tool call started");
        match tool.call(args).await {
            Ok(content) => ToolOutcome {
                content,
                is_error: false,
            },
            Err(e) => {
                warn!(tool = name, error = %e, transient = e.is_transient(), "Tool call failed");
                ToolOutcome {
                    content: format!("{}: {e}", tool.error_prefix()),
                    is_error: true,
                }
            }
        }
    }
}
