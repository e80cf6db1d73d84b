//! Tool failure kinds.
//!
//! Tools return `Result<String, ToolError>`; the registry turns the error side
//! into an error-flagged result text so the model always gets an answer.

use thiserror::Error;

use crate::error::StoreError;
use crate::llm::LlmError;

/// A failed tool invocation.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model error: {0}")]
    Model(String),
}

impl ToolError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ToolError::Network(_) => true,
            ToolError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<StoreError> for ToolError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Network(m) => ToolError::Network(m),
            StoreError::Upstream { status, message } => ToolError::Upstream { status, message },
            StoreError::MalformedResponse(m) => ToolError::MalformedResponse(m),
            StoreError::MissingField(f) => ToolError::MissingField(f),
            StoreError::InvalidInput(m) => ToolError::InvalidInput(m),
        }
    }
}

impl From<LlmError> for ToolError {
    fn from(err: LlmError) -> Self {
        ToolError::Model(err.to_string())
    }
}
