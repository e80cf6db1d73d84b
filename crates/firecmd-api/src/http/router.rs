//! Axum routers for the two servers.
//!
//! Middleware: CORS (any origin) and request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::{GatewayState, RuntimeState};

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Gateway: `POST /analyze`, `GET /health`.
pub fn build_gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/analyze", post(handlers::analyze::analyze))
        .route("/health", get(handlers::analyze::health))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Agent runtime: `POST /invocations`, `GET /ping`.
pub fn build_runtime_router(state: RuntimeState) -> Router {
    Router::new()
        .route("/invocations", post(handlers::invocations::invocations))
        .route("/ping", get(handlers::invocations::ping))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
