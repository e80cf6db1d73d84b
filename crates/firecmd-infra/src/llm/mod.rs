//! LLM provider implementations.
//!
//! The assistant talks to Claude through AWS Bedrock only.

pub mod bedrock;

use firecmd_core::llm::box_provider::BoxLlmProvider;

use crate::aws::AwsClient;

use self::bedrock::BedrockProvider;

/// Build the shared model provider.
pub fn create_provider(aws: AwsClient) -> BoxLlmProvider {
    BoxLlmProvider::new(BedrockProvider::new(aws))
}
