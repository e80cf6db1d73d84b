use thiserror::Error;

/// Errors from managed-store operations (memory, vector index, embeddings).
#[derive(Debug, Error)]
pub enum StoreError {
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
}

impl StoreError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Network(_) => true,
            StoreError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Errors from forwarding a request to the agent runtime.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("runtime unreachable: {0}")]
    Transport(String),

    #[error("runtime returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("runtime not configured: {0}")]
    NotConfigured(String),
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("missing setting '{0}'")]
    Missing(String),
}
