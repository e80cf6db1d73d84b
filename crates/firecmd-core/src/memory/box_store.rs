//! BoxMemoryStore -- object-safe dynamic dispatch wrapper for MemoryStore.

use std::future::Future;
use std::pin::Pin;

use firecmd_types::error::StoreError;
use firecmd_types::memory::{ConversationTurn, MemoryRecord, SessionKey, StoredEvent};

use super::store::MemoryStore;

/// Object-safe version of [`MemoryStore`] with boxed futures.
pub trait MemoryStoreDyn: Send + Sync {
    fn create_event_boxed<'a>(
        &'a self,
        key: &'a SessionKey,
        turns: &'a [ConversationTurn],
    ) -> Pin<Box<dyn Future<Output = Result<String, StoreError>> + Send + 'a>>;

    fn list_events_boxed<'a>(
        &'a self,
        key: &'a SessionKey,
        max_results: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<StoredEvent>, StoreError>> + Send + 'a>>;

    fn retrieve_boxed<'a>(
        &'a self,
        namespace: &'a str,
        query: &'a str,
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MemoryRecord>, StoreError>> + Send + 'a>>;
}

impl<T: MemoryStore> MemoryStoreDyn for T {
    fn create_event_boxed<'a>(
        &'a self,
        key: &'a SessionKey,
        turns: &'a [ConversationTurn],
    ) -> Pin<Box<dyn Future<Output = Result<String, StoreError>> + Send + 'a>> {
        Box::pin(self.create_event(key, turns))
    }

    fn list_events_boxed<'a>(
        &'a self,
        key: &'a SessionKey,
        max_results: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<StoredEvent>, StoreError>> + Send + 'a>> {
        Box::pin(self.list_events(key, max_results))
    }

    fn retrieve_boxed<'a>(
        &'a self,
        namespace: &'a str,
        query: &'a str,
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<MemoryRecord>, StoreError>> + Send + 'a>> {
        Box::pin(self.retrieve(namespace, query, top_k))
    }
}

/// Type-erased memory store.
pub struct BoxMemoryStore {
    inner: Box<dyn MemoryStoreDyn + Send + Sync>,
}

impl BoxMemoryStore {
    pub fn new<T: MemoryStore + 'static>(store: T) -> Self {
        Self {
            inner: Box::new(store),
        }
    }

    pub async fn create_event(
        &self,
        key: &SessionKey,
        turns: &[ConversationTurn],
    ) -> Result<String, StoreError> {
        self.inner.create_event_boxed(key, turns).await
    }

    pub async fn list_events(
        &self,
        key: &SessionKey,
        max_results: usize,
    ) -> Result<Vec<StoredEvent>, StoreError> {
        self.inner.list_events_boxed(key, max_results).await
    }

    pub async fn retrieve(
        &self,
        namespace: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<MemoryRecord>, StoreError> {
        self.inner.retrieve_boxed(namespace, query, top_k).await
    }
}
