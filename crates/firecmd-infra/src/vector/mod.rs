//! Managed embedding model and vector index adapters.
//!
//! Titan embeddings on Bedrock and an S3 Vectors index, implementing the
//! `Embedder` and `VectorIndex` ports from `firecmd-core`.

pub mod s3vectors;
pub mod titan;
