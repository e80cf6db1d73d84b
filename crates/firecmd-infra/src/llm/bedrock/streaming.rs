//! AWS Bedrock event stream parser and async stream adapter.
//!
//! Bedrock streaming uses the AWS event stream binary protocol (not SSE).
//! Each frame has the layout:
//!
//! ```text
//! [total_len:4][headers_len:4][prelude_crc:4][headers...][payload...][msg_crc:4]
//! ```
//!
//! For `chunk` events the payload is `{"bytes":"<base64>"}` where the
//! base64-decoded content is a Messages stream event such as
//! `{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Hi"}}`.
//! Exception frames carry `:message-type = exception` and a JSON message.

use std::collections::HashMap;
use std::pin::Pin;

use base64::Engine;
use futures_util::{Stream, StreamExt};
use tracing::{debug, warn};

use firecmd_types::llm::{LlmError, StopReason, StreamEvent, Usage};

use super::types::{
    BedrockStreamChunk, BlockDelta, ContentBlockDeltaPayload, ContentBlockStartPayload,
    ContentBlockStopPayload, ErrorPayload, ExceptionPayload, MessageDeltaPayload,
    MessageStartPayload, StartBlock,
};

/// Partial JSON input of one tool call.
struct ToolUseAccumulator {
    id: String,
    name: String,
    json_buffer: String,
}

#[derive(Default)]
struct StreamState {
    tool_input_buffers: HashMap<u32, ToolUseAccumulator>,
    message_id: Option<String>,
}

#[derive(Debug)]
struct EventHeader {
    name: String,
    value: String,
}

/// One decoded binary frame.
#[derive(Debug)]
struct Frame {
    message_type: String,
    event_type: String,
    payload: Vec<u8>,
}

/// Parse binary headers from an AWS event stream frame.
///
/// Header format: `[name_len:1][name:N][type:1][value_len:2][value:M]`.
/// Only type 7 (string) is handled; parsing stops at any other type.
fn parse_headers(mut buf: &[u8]) -> Vec<EventHeader> {
    let mut headers = Vec::new();
    while !buf.is_empty() {
        let name_len = buf[0] as usize;
        buf = &buf[1..];
        if buf.len() < name_len {
            break;
        }
        let name = String::from_utf8_lossy(&buf[..name_len]).to_string();
        buf = &buf[name_len..];

        if buf.is_empty() {
            break;
        }
        let header_type = buf[0];
        buf = &buf[1..];

        if header_type != 7 || buf.len() < 2 {
            break;
        }
        let value_len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
        buf = &buf[2..];
        if buf.len() < value_len {
            break;
        }
        let value = String::from_utf8_lossy(&buf[..value_len]).to_string();
        buf = &buf[value_len..];
        headers.push(EventHeader { name, value });
    }
    headers
}

/// Parse one frame from the front of `buf`.
///
/// Returns the frame and the bytes consumed, or `None` if the buffer does
/// not hold a complete frame yet.
fn parse_frame(buf: &[u8]) -> Option<(Frame, usize)> {
    if buf.len() < 12 {
        return None;
    }

    let total_len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    let headers_len = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;

    if buf.len() < total_len {
        return None;
    }

    let headers_start = 12;
    let headers_end = headers_start + headers_len;
    let payload_end = total_len.checked_sub(4)?;

    if headers_end > payload_end {
        return None;
    }

    let headers = parse_headers(&buf[headers_start..headers_end]);
    let header = |name: &str| {
        headers
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.value.clone())
            .unwrap_or_default()
    };

    let message_type = header(":message-type");
    let event_type = if message_type == "exception" {
        header(":exception-type")
    } else {
        header(":event-type")
    };

    Some((
        Frame {
            message_type,
            event_type,
            payload: buf[headers_end..payload_end].to_vec(),
        },
        total_len,
    ))
}

fn exception_error(exception_type: &str, payload: &[u8]) -> LlmError {
    let message = serde_json::from_slice::<ExceptionPayload>(payload)
        .map(|p| p.message)
        .unwrap_or_else(|_| String::from_utf8_lossy(payload).to_string());
    match exception_type {
        "throttlingException" => LlmError::RateLimited {
            retry_after_ms: None,
        },
        "serviceUnavailableException" => LlmError::Overloaded(message),
        "validationException" => LlmError::InvalidRequest(message),
        other => LlmError::Provider {
            message: format!("{other}: {message}"),
        },
    }
}

/// Process one decoded Messages event into zero or more `StreamEvent`s.
fn process_message_event(
    event_type: &str,
    json_data: &str,
    state: &mut StreamState,
) -> Result<Vec<StreamEvent>, LlmError> {
    let mut events = Vec::new();

    match event_type {
        "message_start" => {
            let payload: MessageStartPayload = serde_json::from_str(json_data)
                .map_err(|e| LlmError::Deserialization(format!("message_start: {e}")))?;
            debug!(message_id = %payload.message.id, model = %payload.message.model, "Bedrock message started");
            state.message_id = Some(payload.message.id);
            if let Some(usage) = payload.message.usage {
                events.push(StreamEvent::Usage(Usage {
                    input_tokens: usage.input_tokens,
                    output_tokens: usage.output_tokens,
                }));
            }
        }

        "content_block_start" => {
            let payload: ContentBlockStartPayload = serde_json::from_str(json_data)
                .map_err(|e| LlmError::Deserialization(format!("content_block_start: {e}")))?;
            if let StartBlock::ToolUse { ref id, ref name } = payload.content_block {
                state.tool_input_buffers.insert(
                    payload.index,
                    ToolUseAccumulator {
                        id: id.clone(),
                        name: name.clone(),
                        json_buffer: String::new(),
                    },
                );
            }
            events.push(StreamEvent::ContentBlockStart {
                index: payload.index,
                content_type: payload.content_block.type_name().to_string(),
            });
        }

        "content_block_delta" => {
            let payload: ContentBlockDeltaPayload = serde_json::from_str(json_data)
                .map_err(|e| LlmError::Deserialization(format!("content_block_delta: {e}")))?;
            match payload.delta {
                BlockDelta::TextDelta { text } => {
                    events.push(StreamEvent::TextDelta {
                        index: payload.index,
                        text,
                    });
                }
                BlockDelta::InputJsonDelta { partial_json } => {
                    if let Some(acc) = state.tool_input_buffers.get_mut(&payload.index) {
                        acc.json_buffer.push_str(&partial_json);
                    }
                }
                BlockDelta::Other => {}
            }
        }

        "content_block_stop" => {
            let payload: ContentBlockStopPayload = serde_json::from_str(json_data)
                .map_err(|e| LlmError::Deserialization(format!("content_block_stop: {e}")))?;
            if let Some(acc) = state.tool_input_buffers.remove(&payload.index) {
                let input = if acc.json_buffer.is_empty() {
                    serde_json::Value::Object(Default::default())
                } else {
                    serde_json::from_str(&acc.json_buffer)
                        .map_err(|e| LlmError::Deserialization(format!("tool input JSON: {e}")))?
                };
                events.push(StreamEvent::ToolUseComplete {
                    id: acc.id,
                    name: acc.name,
                    input,
                });
            }
            events.push(StreamEvent::ContentBlockStop {
                index: payload.index,
            });
        }

        "message_delta" => {
            let payload: MessageDeltaPayload = serde_json::from_str(json_data)
                .map_err(|e| LlmError::Deserialization(format!("message_delta: {e}")))?;
            events.push(StreamEvent::Usage(Usage {
                input_tokens: payload.usage.input_tokens,
                output_tokens: payload.usage.output_tokens,
            }));
            events.push(StreamEvent::MessageDelta {
                stop_reason: StopReason::from_provider(payload.delta.stop_reason.as_deref()),
            });
        }

        "message_stop" => {
            events.push(StreamEvent::Done);
        }

        "ping" => {}

        "error" => {
            let payload: ErrorPayload = serde_json::from_str(json_data)
                .map_err(|e| LlmError::Deserialization(format!("error event: {e}")))?;
            return Err(match payload.error.error_type.as_str() {
                "overloaded_error" => LlmError::Overloaded(payload.error.message),
                "rate_limit_error" => LlmError::RateLimited {
                    retry_after_ms: None,
                },
                "authentication_error" => LlmError::AuthenticationFailed,
                _ => LlmError::Provider {
                    message: payload.error.message,
                },
            });
        }

        unknown => {
            warn!(event_type = unknown, "Unknown Bedrock stream event type, skipping");
        }
    }

    Ok(events)
}

/// Decode a `chunk` frame payload and process the event inside it.
fn process_chunk(payload: &[u8], state: &mut StreamState) -> Result<Vec<StreamEvent>, LlmError> {
    let chunk: BedrockStreamChunk = serde_json::from_slice(payload)
        .map_err(|e| LlmError::Deserialization(format!("bedrock chunk wrapper: {e}")))?;
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(&chunk.bytes)
        .map_err(|e| LlmError::Deserialization(format!("base64 decode: {e}")))?;
    let json_str = String::from_utf8(decoded)
        .map_err(|e| LlmError::Deserialization(format!("utf8 decode: {e}")))?;

    let event_json: serde_json::Value = serde_json::from_str(&json_str)
        .map_err(|e| LlmError::Deserialization(format!("inner json: {e}")))?;
    let inner_type = event_json
        .get("type")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    process_message_event(&inner_type, &json_str, state)
}

/// Read a binary event stream response as `StreamEvent`s.
///
/// The request has already been sent and answered with a success status.
pub fn event_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
    Box::pin(async_stream::try_stream! {
        yield StreamEvent::Connected;

        let mut byte_stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut state = StreamState::default();

        while let Some(chunk_result) = byte_stream.next().await {
            let chunk = chunk_result.map_err(|e| LlmError::Stream(format!("response body read: {e}")))?;
            buffer.extend_from_slice(&chunk);

            while let Some((frame, consumed)) = parse_frame(&buffer) {
                buffer.drain(..consumed);

                if frame.message_type == "exception" {
                    Err::<(), _>(exception_error(&frame.event_type, &frame.payload))?;
                }
                match frame.event_type.as_str() {
                    "chunk" => {
                        for ev in process_chunk(&frame.payload, &mut state)? {
                            yield ev;
                        }
                    }
                    "" => {}
                    other => debug!(event_type = other, "Non-chunk Bedrock frame, skipping"),
                }
            }
        }
        debug!(message_id = ?state.message_id, "Bedrock stream finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, value: &str) -> Vec<u8> {
        let mut buf = vec![name.len() as u8];
        buf.extend_from_slice(name.as_bytes());
        buf.push(7);
        buf.extend_from_slice(&(value.len() as u16).to_be_bytes());
        buf.extend_from_slice(value.as_bytes());
        buf
    }

    fn frame(headers: &[(&str, &str)], payload: &[u8]) -> Vec<u8> {
        let headers_buf: Vec<u8> = headers.iter().flat_map(|(n, v)| header(n, v)).collect();
        let total_len = 12 + headers_buf.len() + payload.len() + 4;
        let mut out = Vec::new();
        out.extend_from_slice(&(total_len as u32).to_be_bytes());
        out.extend_from_slice(&(headers_buf.len() as u32).to_be_bytes());
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&headers_buf);
        out.extend_from_slice(payload);
        out.extend_from_slice(&[0u8; 4]);
        out
    }

    fn chunk_payload(event: &str) -> Vec<u8> {
        let b64 = base64::engine::general_purpose::STANDARD.encode(event);
        format!(r#"{{"bytes":"{b64}"}}"#).into_bytes()
    }

    #[test]
    fn test_parse_headers_single_string() {
        let headers = parse_headers(&header(":event-type", "chunk"));
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].name, ":event-type");
        assert_eq!(headers[0].value, "chunk");
    }

    #[test]
    fn test_parse_frame() {
        let payload = b"{\"bytes\":\"dGVzdA==\"}";
        let buf = frame(&[(":event-type", "chunk"), (":message-type", "event")], payload);
        let (parsed, consumed) = parse_frame(&buf).unwrap();
        assert_eq!(parsed.event_type, "chunk");
        assert_eq!(parsed.message_type, "event");
        assert_eq!(consumed, buf.len());
        assert_eq!(parsed.payload, payload);
    }

    #[test]
    fn test_parse_frame_incomplete() {
        assert!(parse_frame(&[0u8; 8]).is_none());
        let buf = frame(&[(":event-type", "chunk")], b"{}");
        assert!(parse_frame(&buf[..buf.len() - 1]).is_none());
    }

    #[test]
    fn test_exception_frame_type() {
        let buf = frame(
            &[(":message-type", "exception"), (":exception-type", "throttlingException")],
            br#"{"message":"Too many requests"}"#,
        );
        let (parsed, _) = parse_frame(&buf).unwrap();
        assert_eq!(parsed.event_type, "throttlingException");
        assert!(matches!(
            exception_error(&parsed.event_type, &parsed.payload),
            LlmError::RateLimited { .. }
        ));
    }

    #[test]
    fn test_text_delta_chunk() {
        let mut state = StreamState::default();
        let payload = chunk_payload(
            r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"화재"}}"#,
        );
        let events = process_chunk(&payload, &mut state).unwrap();
        match &events[..] {
            [StreamEvent::TextDelta { index, text }] => {
                assert_eq!(*index, 0);
                assert_eq!(text, "화재");
            }
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn test_tool_use_is_assembled_from_deltas() {
        let mut state = StreamState::default();
        process_message_event(
            "content_block_start",
            r#"{"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"toolu_1","name":"find_fire_station","input":{}}}"#,
            &mut state,
        )
        .unwrap();
        for part in [r#"{\"addr"#, r#"ess\": \"서울특별시\"}"#] {
            let json = format!(
                r#"{{"type":"content_block_delta","index":1,"delta":{{"type":"input_json_delta","partial_json":"{part}"}}}}"#
            );
            assert!(process_message_event("content_block_delta", &json, &mut state)
                .unwrap()
                .is_empty());
        }
        let events = process_message_event(
            "content_block_stop",
            r#"{"type":"content_block_stop","index":1}"#,
            &mut state,
        )
        .unwrap();
        match &events[0] {
            StreamEvent::ToolUseComplete { id, name, input } => {
                assert_eq!(id, "toolu_1");
                assert_eq!(name, "find_fire_station");
                assert_eq!(input["address"], "서울특별시");
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(events[1], StreamEvent::ContentBlockStop { index: 1 }));
    }

    #[test]
    fn test_tool_use_without_input_gets_empty_object() {
        let mut state = StreamState::default();
        process_message_event(
            "content_block_start",
            r#"{"index":0,"content_block":{"type":"tool_use","id":"t","name":"n"}}"#,
            &mut state,
        )
        .unwrap();
        let events =
            process_message_event("content_block_stop", r#"{"index":0}"#, &mut state).unwrap();
        match &events[0] {
            StreamEvent::ToolUseComplete { input, .. } => assert_eq!(input, &serde_json::json!({})),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_message_delta_stop_reason() {
        let mut state = StreamState::default();
        let events = process_message_event(
            "message_delta",
            r#"{"type":"message_delta","delta":{"stop_reason":"tool_use"},"usage":{"output_tokens":42}}"#,
            &mut state,
        )
        .unwrap();
        assert!(matches!(
            events[1],
            StreamEvent::MessageDelta {
                stop_reason: StopReason::ToolUse
            }
        ));
    }

    #[test]
    fn test_error_event() {
        let mut state = StreamState::default();
        let result = process_message_event(
            "error",
            r#"{"error":{"type":"authentication_error","message":"Invalid API key"}}"#,
            &mut state,
        );
        assert!(matches!(result, Err(LlmError::AuthenticationFailed)));
    }
}
