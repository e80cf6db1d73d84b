//! BedrockProvider -- concrete [`LlmProvider`] implementation for AWS Bedrock.
//!
//! Sends requests to the Bedrock Runtime API through [`AwsClient`], which
//! signs them with SigV4 or attaches the Bedrock API key. Supports both
//! non-streaming (`invoke`) and streaming (`invoke-with-response-stream`)
//! modes. The model id travels per request, so one provider serves both the
//! main agent and the news sub-agent.

use std::pin::Pin;

use futures_util::Stream;
use tracing::{debug, warn};

use firecmd_core::llm::provider::LlmProvider;
use firecmd_types::llm::{
    CompletionRequest, CompletionResponse, LlmError, ProviderCapabilities, StopReason, StreamEvent,
    Usage,
};

use crate::aws::{AwsClient, error_parts};

use super::streaming::event_stream;
use super::types::{BedrockRequest, NonStreamResponse};

/// SigV4 signing name of the Bedrock Runtime API.
const SIGNING_SERVICE: &str = "bedrock";

/// Claude models on AWS Bedrock.
pub struct BedrockProvider {
    aws: AwsClient,
    capabilities: ProviderCapabilities,
}

impl BedrockProvider {
    /// The Anthropic API version for Bedrock.
    const API_VERSION: &'static str = "bedrock-2023-05-31";

    pub fn new(aws: AwsClient) -> Self {
        Self {
            aws,
            capabilities: ProviderCapabilities {
                streaming: true,
                tool_calling: true,
                max_context_tokens: 200_000,
                max_output_tokens: 8_192,
            },
        }
    }

    /// Convert a bare Claude model name to a Bedrock inference profile id.
    ///
    /// Ids that already contain a `.` (`global.anthropic.…`,
    /// `us.anthropic.…`, `anthropic.…`) are returned unchanged. Otherwise
    /// the region shorthand is prefixed:
    ///
    /// ```text
    /// ("claude-sonnet-4-5-20250929", "us-west-2") → "us.anthropic.claude-sonnet-4-5-20250929-v1:0"
    /// ```
    pub fn to_bedrock_model_id(model: &str, region: &str) -> String {
        if model.contains('.') {
            model.to_string()
        } else {
            let region_prefix = region.split('-').next().unwrap_or("us");
            format!("{region_prefix}.anthropic.{model}-v1:0")
        }
    }

    /// Full Bedrock Runtime URL for a model and action.
    fn url(&self, model: &str, action: &str) -> String {
        let model_id = Self::to_bedrock_model_id(model, self.aws.region());
        format!(
            "{}/model/{}/{action}",
            self.aws.endpoint("bedrock-runtime", "amazonaws.com"),
            urlencoding::encode(&model_id)
        )
    }

    fn to_bedrock_request(request: &CompletionRequest) -> BedrockRequest {
        BedrockRequest {
            anthropic_version: Self::API_VERSION.to_string(),
            max_tokens: request.max_tokens,
            messages: request.messages.clone(),
            system: request.system.clone(),
            temperature: request.temperature,
            stop_sequences: request.stop_sequences.clone(),
            tools: request.tools.clone(),
        }
    }

    async fn send(&self, request: &CompletionRequest, action: &str) -> Result<reqwest::Response, LlmError> {
        let url = self.url(&request.model, action);
        let body = Self::to_bedrock_request(request);
        debug!(url = %url, region = %self.aws.region(), "Bedrock request");

        let response = self
            .aws
            .post_json(SIGNING_SERVICE, &url, &body, &[])?
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        if response.status().is_success() {
            return Ok(response);
        }
        let (status, error_body) = error_parts(response).await;
        warn!(status, body = %error_body, url = %url, "Bedrock API error response");
        Err(status_error(status, error_body))
    }
}

/// Map a failed HTTP status to an [`LlmError`].
fn status_error(status: u16, body: String) -> LlmError {
    match status {
        401 | 403 => LlmError::AuthenticationFailed,
        400 | 422 => LlmError::InvalidRequest(body),
        429 => LlmError::RateLimited {
            retry_after_ms: None,
        },
        503 | 529 => LlmError::Overloaded(body),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {body}"),
        },
    }
}

impl LlmProvider for BedrockProvider {
    fn name(&self) -> &str {
        "bedrock"
    }

    fn capabilities(&self) -> &ProviderCapabilities {
        &self.capabilities
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let response = self.send(request, "invoke").await?;
        let resp: NonStreamResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        Ok(CompletionResponse {
            id: resp.id,
            content: resp.content,
            model: resp.model,
            stop_reason: StopReason::from_provider(resp.stop_reason.as_deref()),
            usage: Usage {
                input_tokens: resp.usage.input_tokens,
                output_tokens: resp.usage.output_tokens,
            },
        })
    }

    fn stream(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, LlmError>> + Send + 'static>> {
        let url = self.url(&request.model, "invoke-with-response-stream");
        let body = Self::to_bedrock_request(&request);
        let prepared = self.aws.post_json(SIGNING_SERVICE, &url, &body, &[]);

        Box::pin(async_stream::try_stream! {
            let response = prepared
                .map_err(LlmError::from)?
                .send()
                .await
                .map_err(|e| LlmError::Provider {
                    message: format!("HTTP request failed: {e}"),
                })?;

            if !response.status().is_success() {
                let (status, error_body) = error_parts(response).await;
                warn!(status, body = %error_body, "Bedrock stream API error response");
                Err::<(), _>(status_error(status, error_body))?;
                return;
            }

            let mut events = event_stream(response);
            while let Some(event) = futures_util::StreamExt::next(&mut events).await {
                yield event?;
            }
        })
    }
}
