//! BoxVectorIndex -- object-safe dynamic dispatch wrapper for VectorIndex.

use std::future::Future;
use std::pin::Pin;

use firecmd_types::error::StoreError;
use firecmd_types::vector::{IndexRef, VectorMatch, VectorRecord};

use super::index::VectorIndex;

/// Object-safe version of [`VectorIndex`] with boxed futures.
pub trait VectorIndexDyn: Send + Sync {
    fn query_boxed<'a>(
        &'a self,
        index: &'a IndexRef,
        embedding: &'a [f32],
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<VectorMatch>, StoreError>> + Send + 'a>>;

    fn put_boxed<'a>(
        &'a self,
        index: &'a IndexRef,
        records: &'a [VectorRecord],
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>>;
}

impl<T: VectorIndex> VectorIndexDyn for T {
    fn query_boxed<'a>(
        &'a self,
        index: &'a IndexRef,
        embedding: &'a [f32],
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<VectorMatch>, StoreError>> + Send + 'a>> {
        Box::pin(self.query(index, embedding, top_k))
    }

    fn put_boxed<'a>(
        &'a self,
        index: &'a IndexRef,
        records: &'a [VectorRecord],
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(self.put(index, records))
    }
}

/// Type-erased vector index.
pub struct BoxVectorIndex {
    inner: Box<dyn VectorIndexDyn + Send + Sync>,
}

impl BoxVectorIndex {
    pub fn new<T: VectorIndex + 'static>(index: T) -> Self {
        Self {
            inner: Box::new(index),
        }
    }

    pub async fn query(
        &self,
        index: &IndexRef,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, StoreError> {
        self.inner.query_boxed(index, embedding, top_k).await
    }

    pub async fn put(&self, index: &IndexRef, records: &[VectorRecord]) -> Result<(), StoreError> {
        self.inner.put_boxed(index, records).await
    }
}
