//! AgentCore Memory data-plane client.
//!
//! Implements `MemoryStore` from `firecmd-core`: conversational events per
//! (actor, session) for short-term memory and semantic retrieval over an
//! actor's long-term namespace.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use firecmd_core::memory::store::MemoryStore;
use firecmd_types::error::StoreError;
use firecmd_types::memory::{ConversationTurn, MemoryRecord, SessionKey, StoredEvent, TurnRole};

use crate::aws::{AwsClient, store_upstream};

const SIGNING_SERVICE: &str = "bedrock-agentcore";

/// Largest page the service returns for one ListEvents call.
const LIST_PAGE_SIZE: usize = 100;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct TurnContent {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Conversational {
    content: TurnContent,
    role: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct PayloadItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conversational: Option<Conversational>,
}

impl From<&ConversationTurn> for PayloadItem {
    fn from(turn: &ConversationTurn) -> Self {
        PayloadItem {
            conversational: Some(Conversational {
                content: TurnContent {
                    text: turn.text.clone(),
                },
                role: turn.role.as_str().to_string(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateEventRequest<'a> {
    actor_id: &'a str,
    session_id: &'a str,
    /// Epoch seconds.
    event_timestamp: f64,
    payload: Vec<PayloadItem>,
}

#[derive(Debug, Deserialize)]
struct CreateEventResponse {
    event: EventSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventSummary {
    event_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListEventsRequest<'a> {
    include_payloads: bool,
    max_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListEventsResponse {
    #[serde(default)]
    events: Vec<WireEvent>,
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEvent {
    event_id: String,
    event_timestamp: f64,
    #[serde(default)]
    payload: Vec<PayloadItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveRequest<'a> {
    namespace: &'a str,
    search_criteria: SearchCriteria<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchCriteria<'a> {
    search_query: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveResponse {
    #[serde(default)]
    memory_record_summaries: Vec<RecordSummary>,
}

#[derive(Debug, Deserialize)]
struct RecordSummary {
    content: Option<TurnContent>,
    #[serde(default)]
    namespaces: Vec<String>,
    score: Option<f64>,
}

fn timestamp_from_epoch(seconds: f64) -> DateTime<Utc> {
    let millis = (seconds * 1000.0).round() as i64;
    Utc.timestamp_millis_opt(millis).single().unwrap_or_default()
}

/// Convert a wire event, dropping payload items that are not conversational
/// turns with a known role.
fn stored_event(event: WireEvent) -> StoredEvent {
    let turns = event
        .payload
        .into_iter()
        .filter_map(|item| item.conversational)
        .filter_map(|c| {
            let role: TurnRole = c.role.parse().ok()?;
            Some(ConversationTurn {
                role,
                text: c.content.text,
            })
        })
        .collect();
    StoredEvent {
        event_id: event.event_id,
        timestamp: timestamp_from_epoch(event.event_timestamp),
        turns,
    }
}

fn record(summary: RecordSummary, namespace: &str) -> Option<MemoryRecord> {
    let text = summary.content?.text;
    Some(MemoryRecord {
        text,
        namespace: summary
            .namespaces
            .into_iter()
            .next()
            .unwrap_or_else(|| namespace.to_string()),
        score: summary.score,
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for one AgentCore memory resource.
pub struct AgentCoreMemory {
    aws: AwsClient,
    memory_id: String,
    base_url: String,
}

impl AgentCoreMemory {
    pub fn new(aws: AwsClient, memory_id: impl Into<String>) -> Self {
        let base_url = aws.endpoint("bedrock-agentcore", "amazonaws.com");
        Self {
            aws,
            memory_id: memory_id.into(),
            base_url,
        }
    }

    fn memory_url(&self, suffix: &str) -> String {
        format!(
            "{}/memories/{}{suffix}",
            self.base_url,
            urlencoding::encode(&self.memory_id)
        )
    }

    fn events_url(&self, key: &SessionKey) -> String {
        self.memory_url(&format!(
            "/actor/{}/sessions/{}/events",
            urlencoding::encode(&key.actor_id),
            urlencoding::encode(&key.session_id)
        ))
    }

    async fn post<T: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &T,
        operation: &str,
    ) -> Result<R, StoreError> {
        let response = self
            .aws
            .post_json(SIGNING_SERVICE, url, body, &[])?
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(store_upstream(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| StoreError::MalformedResponse(format!("{operation}: {e}")))
    }
}

impl MemoryStore for AgentCoreMemory {
    async fn create_event(
        &self,
        key: &SessionKey,
        turns: &[ConversationTurn],
    ) -> Result<String, StoreError> {
        if turns.is_empty() {
            return Err(StoreError::InvalidInput("event has no turns".to_string()));
        }
        let body = CreateEventRequest {
            actor_id: &key.actor_id,
            session_id: &key.session_id,
            event_timestamp: Utc::now().timestamp_millis() as f64 / 1000.0,
            payload: turns.iter().map(PayloadItem::from).collect(),
        };
        let response: CreateEventResponse =
            self.post(&self.memory_url("/events"), &body, "CreateEvent").await?;
        debug!(session = %key, event_id = %response.event.event_id, turns = turns.len(), "memory event created");
        Ok(response.event.event_id)
    }

    async fn list_events(
        &self,
        key: &SessionKey,
        max_results: usize,
    ) -> Result<Vec<StoredEvent>, StoreError> {
        let url = self.events_url(key);
        let mut events = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let remaining = max_results.saturating_sub(events.len());
            if remaining == 0 {
                break;
            }
            let body = ListEventsRequest {
                include_payloads: true,
                max_results: remaining.min(LIST_PAGE_SIZE),
                next_token: next_token.as_deref(),
            };
            let page: ListEventsResponse = self.post(&url, &body, "ListEvents").await?;
            events.extend(page.events.into_iter().map(stored_event));
            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        events.sort_by_key(|e| e.timestamp);
        debug!(session = %key, count = events.len(), "memory events listed");
        Ok(events)
    }

    async fn retrieve(
        &self,
        namespace: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<MemoryRecord>, StoreError> {
        let body = RetrieveRequest {
            namespace,
            search_criteria: SearchCriteria {
                search_query: query,
                top_k,
            },
        };
        let response: RetrieveResponse = self
            .post(&self.memory_url("/retrieve"), &body, "RetrieveMemoryRecords")
            .await?;
        Ok(response
            .memory_record_summaries
            .into_iter()
            .filter_map(|s| record(s, namespace))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::AwsAuth;
    use secrecy::SecretString;
    use serde_json::json;

    fn memory() -> AgentCoreMemory {
        AgentCoreMemory::new(
            AwsClient::new(reqwest::Client::new(), AwsAuth::Bearer(SecretString::from("t")), "us-west-2"),
            "FireMemory-abc123",
        )
    }

    #[test]
    fn test_urls() {
        let m = memory();
        assert_eq!(
            m.memory_url("/events"),
            "https://bedrock-agentcore.us-west-2.amazonaws.com/memories/FireMemory-abc123/events"
        );
        assert_eq!(
            m.events_url(&SessionKey::new("chief 7", "s1")),
            "https://bedrock-agentcore.us-west-2.amazonaws.com/memories/FireMemory-abc123/actor/chief%207/sessions/s1/events"
        );
    }

    #[test]
    fn test_create_event_payload() {
        let turns = [ConversationTurn::user("서초구 화재"), ConversationTurn::assistant("출동")];
        let body = CreateEventRequest {
            actor_id: "a",
            session_id: "s",
            event_timestamp: 1.5,
            payload: turns.iter().map(PayloadItem::from).collect(),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["actorId"], "a");
        assert_eq!(
            value["payload"],
            json!([
                {"conversational": {"content": {"text": "서초구 화재"}, "role": "USER"}},
                {"conversational": {"content": {"text": "출동"}, "role": "ASSISTANT"}}
            ])
        );
    }

    #[test]
    fn test_wire_event_conversion_skips_unknown_roles() {
        let wire: WireEvent = serde_json::from_value(json!({
            "eventId": "e1",
            "eventTimestamp": 1760000000.25,
            "payload": [
                {"conversational": {"content": {"text": "hi"}, "role": "USER"}},
                {"conversational": {"content": {"text": "x"}, "role": "TOOL"}},
                {"blob": "ignored"}
            ]
        }))
        .unwrap();
        let event = stored_event(wire);
        assert_eq!(event.turns, vec![ConversationTurn::user("hi")]);
        assert_eq!(event.timestamp.timestamp_millis(), 1_760_000_000_250);
    }

    #[test]
    fn test_retrieve_response_records() {
        let parsed: RetrieveResponse = serde_json::from_value(json!({
            "memoryRecordSummaries": [
                {"content": {"text": "관할은 서초소방서"}, "namespaces": ["/actors/a"], "score": 0.8},
                {"namespaces": []}
            ]
        }))
        .unwrap();
        let records: Vec<MemoryRecord> = parsed
            .memory_record_summaries
            .into_iter()
            .filter_map(|s| record(s, "/actors/a"))
            .collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "관할은 서초소방서");
        assert_eq!(records[0].score, Some(0.8));
    }

    #[test]
    fn test_retrieve_request_shape() {
        let body = RetrieveRequest {
            namespace: "/actors/a",
            search_criteria: SearchCriteria {
                search_query: "q",
                top_k: 3,
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"namespace": "/actors/a", "searchCriteria": {"searchQuery": "q", "topK": 3}})
        );
    }
}
