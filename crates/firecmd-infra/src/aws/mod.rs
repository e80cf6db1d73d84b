//! Signed JSON requests to AWS service endpoints.
//!
//! [`AwsClient`] pairs one shared `reqwest::Client` with the process's AWS
//! authentication and region. Every managed-service adapter (model
//! provider, embedder, vector index, memory, runtime) builds its requests
//! through it.

pub mod credentials;
pub mod sigv4;

use std::sync::Arc;

use chrono::Utc;
use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;

use firecmd_types::error::{GatewayError, StoreError};
use firecmd_types::llm::LlmError;

use self::credentials::{AwsCredentials, non_empty_var};
use self::sigv4::SigningInput;

/// Bedrock API key variable, used when no IAM credentials are set.
pub const BEARER_TOKEN_VAR: &str = "AWS_BEARER_TOKEN_BEDROCK";

/// Failure to build a request before it is sent.
#[derive(Debug, Error)]
pub enum AwsRequestError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("failed to serialize request: {0}")]
    Serialize(String),

    #[error("signing failed: {0}")]
    Signing(String),
}

impl From<AwsRequestError> for StoreError {
    fn from(err: AwsRequestError) -> Self {
        StoreError::InvalidInput(err.to_string())
    }
}

impl From<AwsRequestError> for LlmError {
    fn from(err: AwsRequestError) -> Self {
        LlmError::InvalidRequest(err.to_string())
    }
}

impl From<AwsRequestError> for GatewayError {
    fn from(err: AwsRequestError) -> Self {
        GatewayError::Signing(err.to_string())
    }
}

/// How requests authenticate.
pub enum AwsAuth {
    /// IAM credentials, SigV4-signed per request.
    SigV4(AwsCredentials),
    /// Bedrock API key. Accepted by the model runtime only.
    Bearer(SecretString),
}

impl AwsAuth {
    /// IAM credentials from the environment, else the Bedrock API key.
    pub fn from_env() -> Option<Self> {
        if let Some(credentials) = AwsCredentials::from_env() {
            return Some(AwsAuth::SigV4(credentials));
        }
        non_empty_var(BEARER_TOKEN_VAR).map(|token| AwsAuth::Bearer(SecretString::from(token)))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AwsAuth::SigV4(_) => "sigv4",
            AwsAuth::Bearer(_) => "bearer",
        }
    }
}

/// Shared HTTP client bound to one region and one set of credentials.
#[derive(Clone)]
pub struct AwsClient {
    http: reqwest::Client,
    auth: Arc<AwsAuth>,
    region: String,
}

impl AwsClient {
    pub fn new(http: reqwest::Client, auth: AwsAuth, region: impl Into<String>) -> Self {
        Self {
            http,
            auth: Arc::new(auth),
            region: region.into(),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Same credentials and region over a differently configured client.
    pub fn with_http(&self, http: reqwest::Client) -> Self {
        Self {
            http,
            auth: Arc::clone(&self.auth),
            region: self.region.clone(),
        }
    }

    /// Regional endpoint, e.g. `https://s3vectors.us-west-2.api.aws` for
    /// `("s3vectors", "api.aws")`.
    pub fn endpoint(&self, prefix: &str, domain: &str) -> String {
        format!("https://{prefix}.{}.{domain}", self.region)
    }

    /// Build an authenticated JSON POST. `service` is the SigV4 signing name.
    pub fn post_json<T: Serialize + ?Sized>(
        &self,
        service: &str,
        url: &str,
        body: &T,
        extra_headers: &[(&str, &str)],
    ) -> Result<reqwest::RequestBuilder, AwsRequestError> {
        let parsed = Url::parse(url).map_err(|e| AwsRequestError::InvalidUrl(format!("{url}: {e}")))?;
        let body = serde_json::to_vec(body).map_err(|e| AwsRequestError::Serialize(e.to_string()))?;

        let mut signed_headers: Vec<(&str, &str)> = vec![("content-type", "application/json")];
        signed_headers.extend_from_slice(extra_headers);

        let mut request = self.http.post(parsed.clone());
        for (name, value) in &signed_headers {
            request = request.header(*name, *value);
        }

        request = match self.auth.as_ref() {
            AwsAuth::SigV4(credentials) => {
                let input = SigningInput {
                    method: "POST",
                    url: &parsed,
                    headers: &signed_headers,
                    body: &body,
                };
                let auth_headers = sigv4::sign(credentials, &self.region, service, &input, Utc::now())?;
                auth_headers
                    .into_iter()
                    .fold(request, |req, (name, value)| req.header(name, value))
            }
            AwsAuth::Bearer(token) => {
                request.header("authorization", format!("Bearer {}", token.expose_secret()))
            }
        };
        Ok(request.body(body))
    }
}

/// Status and body text of a failed response.
pub(crate) async fn error_parts(response: reqwest::Response) -> (u16, String) {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    (status, body)
}

/// Map a failed response to [`StoreError::Upstream`].
pub(crate) async fn store_upstream(response: reqwest::Response) -> StoreError {
    let (status, message) = error_parts(response).await;
    StoreError::Upstream { status, message }
}
