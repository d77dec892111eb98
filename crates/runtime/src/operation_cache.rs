use std::future::Future;

/// Storage seam for prepared operations. One cache instance is shared by
/// every operation executing against the engine, so implementations must
/// treat mutation as a critical section.
pub trait OperationCache<V>: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Option<V>> + Send;
    fn insert(&self, key: String, value: V) -> impl Future<Output = ()> + Send;
    /// Number of live entries, for observability and tests.
    fn entry_count(&self) -> usize;
}
