//! Client for the hosted agent runtime, used by the HTTP gateway.
//!
//! Forwards one invocation payload and turns the runtime's server-sent
//! events into a stream of assistant text. Best effort: no retries, and
//! transport failures mid-stream only end the stream.

use std::pin::Pin;
use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::{Stream, StreamExt};
use tracing::{debug, info, warn};

use firecmd_core::gateway::{RUNTIME_SESSION_HEADER, is_event_stream, payload_text, runtime_session_id};
use firecmd_types::agent::Invocation;
use firecmd_types::config::GatewaySettings;
use firecmd_types::error::GatewayError;

use crate::aws::AwsClient;

/// SigV4 signing name of the runtime data plane.
const SIGNING_SERVICE: &str = "bedrock-agentcore";

/// Assistant text chunks in arrival order.
pub type TextStream = Pin<Box<dyn Stream<Item = String> + Send + 'static>>;

enum Target {
    /// Hosted runtime addressed by ARN, SigV4-signed.
    Hosted { arn: String, aws: AwsClient },
    /// Local runtime server, unsigned.
    Local { endpoint: String },
}

pub struct RuntimeClient {
    http: reqwest::Client,
    target: Target,
    fixed_session_id: Option<String>,
}

impl RuntimeClient {
    /// Build from gateway settings. A local endpoint wins over an ARN; the
    /// ARN needs AWS credentials.
    pub fn from_settings(settings: &GatewaySettings, aws: Option<&AwsClient>) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .read_timeout(Duration::from_secs(settings.read_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let target = match (&settings.runtime_endpoint, &settings.runtime_arn) {
            (Some(endpoint), _) if !endpoint.is_empty() => Target::Local {
                endpoint: endpoint.trim_end_matches('/').to_string(),
            },
            (_, Some(arn)) if !arn.is_empty() => {
                let aws = aws.ok_or_else(|| {
                    GatewayError::NotConfigured("AWS credentials are required for runtime_arn".to_string())
                })?;
                Target::Hosted {
                    arn: arn.clone(),
                    aws: aws.with_http(http.clone()),
                }
            }
            _ => {
                return Err(GatewayError::NotConfigured(
                    "set gateway.runtime_arn or gateway.runtime_endpoint".to_string(),
                ));
            }
        };

        Ok(Self {
            http,
            target,
            fixed_session_id: settings.runtime_session_id.clone().filter(|s| !s.is_empty()),
        })
    }

    pub fn invocation_url(&self) -> String {
        match &self.target {
            Target::Hosted { arn, aws } => format!(
                "{}/runtimes/{}/invocations?qualifier=DEFAULT",
                aws.endpoint("bedrock-agentcore", "amazonaws.com"),
                urlencoding::encode(arn)
            ),
            Target::Local { endpoint } => format!("{endpoint}/invocations"),
        }
    }

    fn session_id(&self, invocation: &Invocation) -> String {
        self.fixed_session_id
            .clone()
            .unwrap_or_else(|| runtime_session_id(&invocation.actor_id, &invocation.session_id))
    }

    /// Send the invocation and stream back the assistant text.
    ///
    /// A response that is not an event stream yields an empty stream.
    pub async fn invoke(&self, invocation: &Invocation) -> Result<TextStream, GatewayError> {
        let url = self.invocation_url();
        let session_id = self.session_id(invocation);
        let headers = [(RUNTIME_SESSION_HEADER, session_id.as_str()), ("accept", "text/event-stream")];

        let request = match &self.target {
            Target::Hosted { aws, .. } => aws.post_json(SIGNING_SERVICE, &url, invocation, &headers)?,
            Target::Local { .. } => headers
                .iter()
                .fold(self.http.post(&url).json(invocation), |req, (k, v)| req.header(*k, *v)),
        };

        info!(url = %url, actor_id = %invocation.actor_id, session_id = %invocation.session_id, "Invoking agent runtime");
        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_event_stream(&content_type) {
            debug!(content_type = %content_type, "runtime response is not an event stream");
            return Ok(Box::pin(futures_util::stream::empty()));
        }

        Ok(text_stream(response))
    }
}

fn text_stream(response: reqwest::Response) -> TextStream {
    let mut events = response.bytes_stream().eventsource();
    Box::pin(async_stream::stream! {
        while let Some(event) = events.next().await {
            match event {
                Ok(event) => {
                    if let Some(text) = payload_text(&event.data) {
                        yield text;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "runtime stream ended with an error");
                    break;
                }
            }
        }
    })
}
