//! Test doubles shared by the unit tests in this crate.

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use futures_util::Stream;

use firecmd_types::error::StoreError;
use firecmd_types::llm::{
    CompletionRequest, CompletionResponse, ContentBlock, LlmError, ProviderCapabilities,
    StopReason, StreamEvent, Usage,
};
use firecmd_types::memory::{ConversationTurn, MemoryRecord, SessionKey, StoredEvent};
use firecmd_types::vector::{IndexRef, VectorMatch, VectorRecord};

use crate::llm::box_provider::BoxLlmProvider;
use crate::llm::provider::LlmProvider;
use crate::memory::box_store::BoxMemoryStore;
use crate::memory::store::MemoryStore;
use crate::vector::box_embedder::BoxEmbedder;
use crate::vector::box_index::BoxVectorIndex;
use crate::vector::embedder::Embedder;
use crate::vector::index::VectorIndex;

pub fn event(turns: Vec<ConversationTurn>) -> StoredEvent {
    StoredEvent {
        event_id: format!("evt-{}", turns.len()),
        timestamp: Utc::now(),
        turns,
    }
}

#[derive(Default)]
pub struct StoreState {
    pub events: HashMap<SessionKey, Vec<StoredEvent>>,
    pub records: HashMap<String, Vec<MemoryRecord>>,
    pub queries: Vec<(String, String)>,
    pub fail: bool,
}

/// Memory store backed by a shared map. Clones share state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    pub state: Arc<Mutex<StoreState>>,
}

impl InMemoryStore {
    pub fn failing() -> Self {
        let store = Self::default();
        store.state.lock().unwrap().fail = true;
        store
    }

    pub fn boxed(&self) -> Arc<BoxMemoryStore> {
        Arc::new(BoxMemoryStore::new(self.clone()))
    }

    pub fn add_record(&self, namespace: &str, text: &str) {
        self.state
            .lock()
            .unwrap()
            .records
            .entry(namespace.to_string())
            .or_default()
            .push(MemoryRecord {
                text: text.to_string(),
                namespace: namespace.to_string(),
                score: None,
            });
    }

    pub fn turns(&self, key: &SessionKey) -> Vec<ConversationTurn> {
        self.state
            .lock()
            .unwrap()
            .events
            .get(key)
            .map(|events| events.iter().flat_map(|e| e.turns.clone()).collect())
            .unwrap_or_default()
    }

    pub fn events(&self, key: &SessionKey) -> Vec<StoredEvent> {
        self.state
            .lock()
            .unwrap()
            .events
            .get(key)
            .cloned()
            .unwrap_or_default()
    }
}

impl MemoryStore for InMemoryStore {
    async fn create_event(
        &self,
        key: &SessionKey,
        turns: &[ConversationTurn],
    ) -> Result<String, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(StoreError::Network("connection refused".to_string()));
        }
        let events = state.events.entry(key.clone()).or_default();
        let id = format!("evt-{}", events.len());
        events.push(StoredEvent {
            event_id: id.clone(),
            timestamp: Utc::now(),
            turns: turns.to_vec(),
        });
        Ok(id)
    }

    async fn list_events(
        &self,
        key: &SessionKey,
        max_results: usize,
    ) -> Result<Vec<StoredEvent>, StoreError> {
        let state = self.state.lock().unwrap();
        if state.fail {
            return Err(StoreError::Network("connection refused".to_string()));
        }
        let events = state.events.get(key).cloned().unwrap_or_default();
        let skip = events.len().saturating_sub(max_results);
        Ok(events.into_iter().skip(skip).collect())
    }

    async fn retrieve(
        &self,
        namespace: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<MemoryRecord>, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            return Err(StoreError::Upstream {
                status: 500,
                message: "internal".to_string(),
            });
        }
        state
            .queries
            .push((namespace.to_string(), query.to_string()));
        Ok(state
            .records
            .get(namespace)
            .map(|r| r.iter().take(top_k).cloned().collect())
            .unwrap_or_default())
    }
}

/// One scripted model turn.
pub enum Script {
    Events(Vec<StreamEvent>),
    Fail(String),
}

/// Text-only model turn.
pub fn text_turn(text: &str) -> Script {
    Script::Events(vec![
        StreamEvent::Connected,
        StreamEvent::TextDelta {
            index: 0,
            text: text.to_string(),
        },
        StreamEvent::MessageDelta {
            stop_reason: StopReason::EndTurn,
        },
        StreamEvent::Done,
    ])
}

/// Model turn that says `preamble` and then calls one tool.
pub fn tool_turn(preamble: &str, id: &str, name: &str, input: serde_json::Value) -> Script {
    let mut events = vec![StreamEvent::Connected];
    if !preamble.is_empty() {
        events.push(StreamEvent::TextDelta {
            index: 0,
            text: preamble.to_string(),
        });
    }
    events.push(StreamEvent::ToolUseComplete {
        id: id.to_string(),
        name: name.to_string(),
        input,
    });
    events.push(StreamEvent::MessageDelta {
        stop_reason: StopReason::ToolUse,
    });
    events.push(StreamEvent::Done);
    Script::Events(events)
}

/// Provider replaying scripted turns and recording every request.
#[derive(Clone)]
pub struct ScriptedProvider {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
    capabilities: ProviderCapabilities,
}

impl ScriptedProvider {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
            capabilities: ProviderCapabilities {
                streaming: true,
                tool_calling: true,
                max_context_tokens: 200_000,
                max_output_tokens: 8192,
            },
        }
    }

    pub fn boxed(&self) -> Arc<BoxLlmProvider> {
        Arc::new(BoxLlmProvider::new(self.clone()))
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let script = self.scripts.lock().unwrap().pop_front();
        match script {
            Some(Script::Events(events)) => {
                let text: String = events
                    .iter()
                    .filter_map(|e| match e {
                        StreamEvent::TextDelta { text, .. } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                Ok(CompletionResponse {
                    id: "msg_scripted".to_string(),
                    content: vec![ContentBlock::text(text)],
                    model: request.model.clone(),
                    stop_reason: StopReason::EndTurn,
                    usage: Usage::default(),
                })
            }
            Some(Script::Fail(message)) => Err(LlmError::Provider { message }),
            None => Err(LlmError::Provider {
                message: "script exhausted".to_string(),
            }),
        }
    }

    fn stream(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
        self.requests.lock().unwrap().push(request);
        let script = self.scripts.lock().unwrap().pop_front();
        let items: Vec<Result<StreamEvent, LlmError>> = match script {
            Some(Script::Events(events)) => events.into_iter().map(Ok).collect(),
            Some(Script::Fail(message)) => vec![Err(LlmError::Provider { message })],
            None => vec![Err(LlmError::Provider {
                message: "script exhausted".to_string(),
            })],
        };
        Box::pin(futures_util::stream::iter(items))
    }
}

/// Embedder returning a fixed vector, or failing.
pub struct FixedEmbedder {
    pub fail: bool,
}

impl Embedder for FixedEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, StoreError> {
        if self.fail {
            return Err(StoreError::Upstream {
                status: 503,
                message: "throttled".to_string(),
            });
        }
        Ok(texts.iter().map(|_| vec![0.5; 4]).collect())
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    fn dimension(&self) -> usize {
        4
    }
}

pub fn fixed_embedder() -> Arc<BoxEmbedder> {
    Arc::new(BoxEmbedder::new(FixedEmbedder { fail: false }))
}

/// Index returning canned matches and recording writes.
#[derive(Clone, Default)]
pub struct CannedIndex {
    pub matches: Vec<VectorMatch>,
    pub written: Arc<Mutex<Vec<(IndexRef, Vec<VectorRecord>)>>>,
}

impl VectorIndex for CannedIndex {
    async fn query(
        &self,
        _index: &IndexRef,
        _embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, StoreError> {
        Ok(self.matches.iter().take(top_k).cloned().collect())
    }

    async fn put(&self, index: &IndexRef, records: &[VectorRecord]) -> Result<(), StoreError> {
        self.written
            .lock()
            .unwrap()
            .push((index.clone(), records.to_vec()));
        Ok(())
    }
}

pub fn canned_index(matches: Vec<VectorMatch>) -> Arc<BoxVectorIndex> {
    Arc::new(BoxVectorIndex::new(CannedIndex {
        matches,
        written: Arc::default(),
    }))
}
