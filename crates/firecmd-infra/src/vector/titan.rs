//! Titan text embeddings on AWS Bedrock.
//!
//! Implements the `Embedder` trait from `firecmd-core`. Titan v2 embeds one
//! text per call, so batches are sent sequentially.

use serde::{Deserialize, Serialize};
use tracing::debug;

use firecmd_core::vector::embedder::Embedder;
use firecmd_types::error::StoreError;
use firecmd_types::vector::EMBEDDING_DIMENSION;

use crate::aws::{AwsClient, store_upstream};

/// Default Titan embedding model.
pub const TITAN_MODEL_ID: &str = "amazon.titan-embed-text-v2:0";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    input_text: &'a str,
    dimensions: usize,
    normalize: bool,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Option<Vec<f32>>,
}

/// Bedrock-hosted Titan embedder producing normalized 1024-dimension vectors.
pub struct TitanEmbedder {
    aws: AwsClient,
    model_id: String,
}

impl TitanEmbedder {
    pub fn new(aws: AwsClient, model_id: impl Into<String>) -> Self {
        Self {
            aws,
            model_id: model_id.into(),
        }
    }

    fn url(&self) -> String {
        format!(
            "{}/model/{}/invoke",
            self.aws.endpoint("bedrock-runtime", "amazonaws.com"),
            urlencoding::encode(&self.model_id)
        )
    }

    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, StoreError> {
        let body = EmbedRequest {
            input_text: text,
            dimensions: EMBEDDING_DIMENSION,
            normalize: true,
        };
        let response = self
            .aws
            .post_json("bedrock", &self.url(), &body, &[])?
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(store_upstream(response).await);
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| StoreError::MalformedResponse(format!("embedding response: {e}")))?;
        let embedding = parsed
            .embedding
            .ok_or_else(|| StoreError::MissingField("embedding".to_string()))?;
        check_dimension(&embedding)?;
        Ok(embedding)
    }
}

fn check_dimension(embedding: &[f32]) -> Result<(), StoreError> {
    if embedding.len() != EMBEDDING_DIMENSION {
        return Err(StoreError::MalformedResponse(format!(
            "expected {EMBEDDING_DIMENSION} dimensions, got {}",
            embedding.len()
        )));
    }
    Ok(())
}

impl Embedder for TitanEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, StoreError> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed_text(text).await?);
        }
        debug!(count = vectors.len(), model = %self.model_id, "embedded texts");
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        EMBEDDING_DIMENSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::AwsAuth;
    use secrecy::SecretString;

    #[test]
    fn test_request_body_shape() {
        let body = EmbedRequest {
            input_text: "서초소방서",
            dimensions: EMBEDDING_DIMENSION,
            normalize: true,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"inputText": "서초소방서", "dimensions": 1024, "normalize": true})
        );
    }

    #[test]
    fn test_missing_embedding_field() {
        let parsed: EmbedResponse = serde_json::from_str(r#"{"inputTextTokenCount": 3}"#).unwrap();
        assert!(parsed.embedding.is_none());
    }

    #[test]
    fn test_dimension_check() {
        assert!(check_dimension(&vec![0.0; EMBEDDING_DIMENSION]).is_ok());
        assert!(matches!(
            check_dimension(&[0.1, 0.2]),
            Err(StoreError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_invoke_url() {
        let aws = AwsClient::new(
            reqwest::Client::new(),
            AwsAuth::Bearer(SecretString::from("t")),
            "us-west-2",
        );
        let embedder = TitanEmbedder::new(aws, TITAN_MODEL_ID);
        assert_eq!(
            embedder.url(),
            "https://bedrock-runtime.us-west-2.amazonaws.com/model/amazon.titan-embed-text-v2%3A0/invoke"
        );
        assert_eq!(embedder.dimension(), 1024);
    }
}
