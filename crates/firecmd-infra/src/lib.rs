//! Infrastructure layer for firecmd.
//!
//! Implements the ports defined in `firecmd-core` over HTTP: the Bedrock
//! model provider, Titan embeddings, the S3 Vectors index and AgentCore
//! memory (all SigV4-signed through [`aws::AwsClient`]), plus the public
//! web services behind the tools, the hosted runtime client, configuration
//! loading and the offline embedding loaders.

pub mod aws;
pub mod config;
pub mod llm;
pub mod loader;
pub mod memory;
pub mod runtime_client;
pub mod vector;
pub mod web;
