//! Test harness for the engine: an in-memory runtime, a builder over the
//! common knobs and the fixture schemas the tests share.

pub mod fixtures;

use std::sync::Arc;

use graphloom::{AppContext, BatchRequest, CachedOperation, Engine, EngineConfig, LoaderRegistry, Request, Runtime, Schema};
use graphloom_runtime::{operation_cache::OperationCache, persisted_queries::PersistedQueryStore};
use graphloom_runtime_local::{InMemoryOperationCache, StaticPersistedQueryStore};

pub type PlanCache = Arc<InMemoryOperationCache<Arc<CachedOperation>>>;

/// A fresh bounded cache, shareable between engines to exercise schema
/// swaps.
pub fn plan_cache(limit: usize) -> PlanCache {
    Arc::new(InMemoryOperationCache::new(limit))
}

pub struct TestRuntime {
    cache: PlanCache,
    persisted: StaticPersistedQueryStore,
}

impl Runtime for TestRuntime {
    type OperationCache = InMemoryOperationCache<Arc<CachedOperation>>;

    fn operation_cache(&self) -> &Self::OperationCache {
        &self.cache
    }

    fn persisted_queries(&self) -> &dyn PersistedQueryStore {
        &self.persisted
    }
}

pub struct TestEngine {
    engine: Engine<TestRuntime>,
}

impl TestEngine {
    pub fn builder(schema: Schema) -> TestEngineBuilder {
        TestEngineBuilder {
            schema,
            loaders: LoaderRegistry::default(),
            config: EngineConfig::default(),
            persisted: StaticPersistedQueryStore::default(),
            cache: None,
        }
    }

    pub fn engine(&self) -> &Engine<TestRuntime> {
        &self.engine
    }

    pub fn plan_cache_entries(&self) -> usize {
        self.engine.runtime.operation_cache().entry_count()
    }

    /// Executes and returns the serialized response envelope.
    pub async fn execute(&self, request: Request) -> serde_json::Value {
        self.execute_with(request, no_app()).await
    }

    pub async fn execute_with(&self, request: Request, app: AppContext) -> serde_json::Value {
        serde_json::to_value(self.engine.execute(request, app).await).unwrap()
    }

    pub async fn execute_query(&self, query: &str) -> serde_json::Value {
        self.execute(Request::new(query)).await
    }

    /// Feeds a raw JSON body through batch deserialization and execution.
    pub async fn execute_body(&self, body: serde_json::Value) -> serde_json::Value {
        let batch: BatchRequest = serde_json::from_value(body).unwrap();
        serde_json::to_value(self.engine.execute_batch(batch, no_app()).await).unwrap()
    }
}

pub fn no_app() -> AppContext {
    Arc::new(())
}

pub struct TestEngineBuilder {
    schema: Schema,
    loaders: LoaderRegistry,
    config: EngineConfig,
    persisted: StaticPersistedQueryStore,
    cache: Option<PlanCache>,
}

impl TestEngineBuilder {
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_loaders(mut self, loaders: LoaderRegistry) -> Self {
        self.loaders = loaders;
        self
    }

    #[must_use]
    pub fn with_persisted_document(mut self, doc_id: impl Into<String>, document: impl Into<String>) -> Self {
        self.persisted.insert(doc_id, document);
        self
    }

    #[must_use]
    pub fn with_plan_cache(mut self, cache: PlanCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> TestEngine {
        let runtime = TestRuntime {
            cache: self.cache.unwrap_or_else(|| plan_cache(1000)),
            persisted: self.persisted,
        };
        TestEngine {
            engine: Engine::new(Arc::new(self.schema), self.loaders, self.config, runtime),
        }
    }
}
