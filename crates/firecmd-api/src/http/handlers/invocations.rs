//! Agent runtime endpoints.
//!
//! POST /invocations streams the agent's events for one prompt as SSE, one
//! JSON [`AgentEvent`] per `data` line. Every request gets a fresh agent
//! bound to its `(actor_id, session_id)` memory session.

use std::convert::Infallible;
use std::time::Duration;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::{Stream, StreamExt};
use serde_json::{Value, json};
use tracing::{info, info_span, warn};

use firecmd_core::agent::engine::StreamInSpan;
use firecmd_observe::genai_attrs;
use firecmd_types::agent::{AgentEvent, InvocationDefaults, InvocationRequest};

use crate::http::error::AppError;
use crate::state::RuntimeState;

/// POST /invocations
pub async fn invocations(
    State(state): State<RuntimeState>,
    body: Result<Json<InvocationRequest>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let invocation = request.resolve(InvocationDefaults::RUNTIME);

    let agent_name = state.factory.agent_name().to_string();
    let span = info_span!(
        "gen_ai.invoke_agent",
        otel.name = %genai_attrs::span_name(genai_attrs::OP_INVOKE_AGENT, &agent_name),
        gen_ai.operation.name = genai_attrs::OP_INVOKE_AGENT,
        gen_ai.provider.name = genai_attrs::PROVIDER_AWS_BEDROCK,
        gen_ai.agent.name = %agent_name,
        gen_ai.conversation.id = %invocation.session_id,
        actor_id = %invocation.actor_id,
    );
    info!(parent: &span, prompt_chars = invocation.prompt.chars().count(), "Invocation received");

    let agent = state
        .factory
        .create_agent(&invocation.actor_id, &invocation.session_id)
        .await;
    let events = StreamInSpan::new(agent.stream(invocation.prompt), span)
        .map(|event| Ok::<_, Infallible>(sse_event(&event)));

    Ok(Sse::new(events).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}

fn sse_event(event: &AgentEvent) -> Event {
    Event::default().json_data(event).unwrap_or_else(|e| {
        warn!(error = %e, "failed to encode agent event");
        Event::default().data(json!({"event": "error", "message": e.to_string()}).to_string())
    })
}

/// GET /ping
pub async fn ping() -> Json<Value> {
    Json(json!({"status": "Healthy"}))
}
