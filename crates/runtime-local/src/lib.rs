mod operation_cache;
mod persisted_queries;

pub use operation_cache::{InMemoryOperationCache, NoopOperationCache};
pub use persisted_queries::StaticPersistedQueryStore;
