//! AWS Bedrock request/response types.
//!
//! Bedrock takes the Claude Messages JSON format with two differences:
//! - The `model` field is omitted from the request body (it goes in the URL path).
//! - An `anthropic_version` field is required in the request body.
//!
//! Conversation messages and tool definitions serialize directly from the
//! shared `firecmd-types` shapes.

use serde::{Deserialize, Serialize};

use firecmd_types::llm::{ContentBlock, Message, ToolDefinition};

/// Request body for Bedrock `invoke` / `invoke-with-response-stream`.
#[derive(Debug, Clone, Serialize)]
pub struct BedrockRequest {
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// A single chunk in the Bedrock event stream.
///
/// Bedrock wraps each Messages stream event inside `{"bytes":"<base64>"}`.
#[derive(Debug, Clone, Deserialize)]
pub struct BedrockStreamChunk {
    pub bytes: String,
}

/// Payload of an exception frame.
#[derive(Debug, Clone, Deserialize)]
pub struct ExceptionPayload {
    #[serde(default, alias = "Message")]
    pub message: String,
}

// ---------------------------------------------------------------------------
// Decoded stream event payloads, dispatched on their `type` field.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MessageStartPayload {
    pub message: MessageObj,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageObj {
    pub id: String,
    pub model: String,
    pub usage: Option<BedrockUsage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlockStartPayload {
    pub index: u32,
    pub content_block: StartBlock,
}

/// Opening of a content block. Tool input arrives later as JSON deltas.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StartBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
    },
    #[serde(other)]
    Other,
}

impl StartBlock {
    pub fn type_name(&self) -> &'static str {
        match self {
            StartBlock::Text { .. } => "text",
            StartBlock::ToolUse { .. } => "tool_use",
            StartBlock::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlockDeltaPayload {
    pub index: u32,
    pub delta: BlockDelta,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockDelta {
    TextDelta { text: String },
    InputJsonDelta { partial_json: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentBlockStopPayload {
    pub index: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageDeltaPayload {
    pub delta: MessageDeltaObj,
    #[serde(default)]
    pub usage: BedrockUsage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageDeltaObj {
    pub stop_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BedrockUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorPayload {
    pub error: ErrorObj,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorObj {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

/// Non-streaming `invoke` response.
#[derive(Debug, Clone, Deserialize)]
pub struct NonStreamResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: BedrockUsage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let req = BedrockRequest {
            anthropic_version: "bedrock-2023-05-31".to_string(),
            max_tokens: 1024,
            messages: vec![Message::user("Hello")],
            system: Some("Be helpful.".to_string()),
            temperature: None,
            stop_sequences: None,
            tools: vec![ToolDefinition {
                name: "find_fire_station".to_string(),
                description: "stations".to_string(),
                input_schema: json!({"type": "object"}),
            }],
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["anthropic_version"], "bedrock-2023-05-31");
        assert!(json.get("model").is_none());
        assert!(json.get("temperature").is_none());
        assert_eq!(
            json["messages"][0],
            json!({"role": "user", "content": [{"type": "text", "text": "Hello"}]})
        );
        assert_eq!(json["tools"][0]["input_schema"], json!({"type": "object"}));
    }

    #[test]
    fn test_empty_tools_are_omitted() {
        let req = BedrockRequest {
            anthropic_version: "bedrock-2023-05-31".to_string(),
            max_tokens: 16,
            messages: vec![],
            system: None,
            temperature: Some(0.2),
            stop_sequences: None,
            tools: vec![],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("tools").is_none());
    }

    #[test]
    fn test_start_block_variants() {
        let block: StartBlock =
            serde_json::from_str(r#"{"type":"tool_use","id":"toolu_1","name":"wikipedia","input":{}}"#)
                .unwrap();
        assert!(matches!(block, StartBlock::ToolUse { ref name, .. } if name == "wikipedia"));

        let block: StartBlock = serde_json::from_str(r#"{"type":"thinking","thinking":""}"#).unwrap();
        assert!(matches!(block, StartBlock::Other));
    }

    #[test]
    fn test_non_stream_response_with_tool_use() {
        let json = r#"{
            "id": "msg_1",
            "model": "claude",
            "content": [
                {"type": "text", "text": "조회합니다"},
                {"type": "tool_use", "id": "toolu_1", "name": "get_weather_info", "input": {"latitude": 37.5, "longitude": 127.0}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 5}
        }"#;
        let resp: NonStreamResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.content.len(), 2);
        assert_eq!(resp.stop_reason.as_deref(), Some("tool_use"));
    }
}
