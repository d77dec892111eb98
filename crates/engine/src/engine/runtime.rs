use std::sync::Arc;

use graphloom_runtime::{operation_cache::OperationCache, persisted_queries::PersistedQueryStore};

use crate::prepare::CachedOperation;

/// Services the engine depends on but does not implement itself. The plan
/// cache outlives any single engine: a new engine built for a new schema can
/// share it, old entries being unreachable through version-scoped keys.
pub trait Runtime: Send + Sync + 'static {
    type OperationCache: OperationCache<Arc<CachedOperation>>;

    fn operation_cache(&self) -> &Self::OperationCache;
    fn persisted_queries(&self) -> &dyn PersistedQueryStore;
}
