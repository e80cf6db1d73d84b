//! Vector index trait.

use firecmd_types::error::StoreError;
use firecmd_types::vector::{IndexRef, VectorMatch, VectorRecord};

/// Trait for a managed nearest-neighbour index.
///
/// Ranking and key uniqueness belong to the index; callers never re-rank
/// or de-duplicate.
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` nearest records with their metadata, best first.
    fn query(
        &self,
        index: &IndexRef,
        embedding: &[f32],
        top_k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<VectorMatch>, StoreError>> + Send;

    /// Write one batch of records.
    fn put(
        &self,
        index: &IndexRef,
        records: &[VectorRecord],
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;
}
