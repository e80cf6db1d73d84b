//! Memory store trait.

use firecmd_types::error::StoreError;
use firecmd_types::memory::{ConversationTurn, MemoryRecord, SessionKey, StoredEvent};

/// Trait for the managed conversation memory service.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
/// Implementations live in firecmd-infra.
pub trait MemoryStore: Send + Sync {
    /// Append one event holding `turns` to the session. Returns the event id.
    fn create_event(
        &self,
        key: &SessionKey,
        turns: &[ConversationTurn],
    ) -> impl std::future::Future<Output = Result<String, StoreError>> + Send;

    /// List up to `max_results` of the session's most recent events,
    /// oldest first.
    fn list_events(
        &self,
        key: &SessionKey,
        max_results: usize,
    ) -> impl std::future::Future<Output = Result<Vec<StoredEvent>, StoreError>> + Send;

    /// Semantic search over the long-term records in `namespace`.
    fn retrieve(
        &self,
        namespace: &str,
        query: &str,
        top_k: usize,
    ) -> impl std::future::Future<Output = Result<Vec<MemoryRecord>, StoreError>> + Send;
}
