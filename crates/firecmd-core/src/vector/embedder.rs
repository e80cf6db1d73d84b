//! Embedder trait for text-to-vector conversion.

use firecmd_types::error::StoreError;

/// Trait for converting text into embedding vectors.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in firecmd-infra.
pub trait Embedder: Send + Sync {
    /// Embed one or more texts into vectors, one vector per input.
    fn embed(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, StoreError>> + Send;

    /// The model identifier used for embeddings.
    fn model_name(&self) -> &str;

    /// The dimensionality of the output vectors.
    fn dimension(&self) -> usize;
}
