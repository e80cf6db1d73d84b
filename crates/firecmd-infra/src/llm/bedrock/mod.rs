//! AWS Bedrock LLM provider implementation.
//!
//! Implements [`LlmProvider`](firecmd_core::llm::provider::LlmProvider) for
//! the Bedrock Runtime API, using the shared [`AwsClient`](crate::aws::AwsClient)
//! for authentication and the Bedrock event stream binary protocol.

mod client;
mod streaming;
pub mod types;

pub use client::BedrockProvider;
