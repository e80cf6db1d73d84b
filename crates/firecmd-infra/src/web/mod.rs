//! Public web service clients backing the tools.
//!
//! Each client implements one of the service ports declared next to its tool
//! in `firecmd-core::tool`. Failures map to [`ToolError`] kinds so the
//! dispatcher can report them in-band.

pub mod browser;
pub mod nominatim;
pub mod wikipedia;
pub mod windy;

use firecmd_types::tool::ToolError;

fn network_error(err: reqwest::Error) -> ToolError {
    ToolError::Network(err.to_string())
}

/// Pass a successful response through, else turn it into [`ToolError::Upstream`].
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ToolError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(ToolError::Upstream { status, message })
}

async fn read_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> Result<T, ToolError> {
    response
        .json()
        .await
        .map_err(|e| ToolError::MalformedResponse(format!("{what}: {e}")))
}
