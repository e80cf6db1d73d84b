//! Gateway endpoints.
//!
//! POST /analyze
//!
//! Forwards the request to the agent runtime and re-streams the assistant
//! text as `text/plain`. Once the upstream stream is open, failures only
//! end the body early.

use std::convert::Infallible;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures_util::StreamExt;
use tracing::warn;

use firecmd_infra::runtime_client::TextStream;
use firecmd_types::agent::{InvocationDefaults, InvocationRequest};
use firecmd_types::error::GatewayError;

use crate::http::error::AppError;
use crate::state::GatewayState;

/// POST /analyze
pub async fn analyze(
    State(state): State<GatewayState>,
    body: Result<Json<InvocationRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let invocation = request.resolve(InvocationDefaults::GATEWAY);

    let text: TextStream = match state.runtime.invoke(&invocation).await {
        Ok(text) => text,
        Err(GatewayError::Transport(message)) => {
            warn!(error = %message, "agent runtime unreachable, returning an empty answer");
            Box::pin(futures_util::stream::empty())
        }
        Err(e) => return Err(e.into()),
    };

    let body = Body::from_stream(text.map(Ok::<_, Infallible>));
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}
