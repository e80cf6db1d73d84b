//! HTTP layer: the gateway (`/analyze`) and the agent runtime server
//! (`/invocations`, `/ping`).

pub mod error;
pub mod handlers;
pub mod router;
