use std::{future::Future, sync::Arc};

use futures::future::BoxFuture;
use fxhash::FxHashMap;
use graphloom_error::GraphqlResult;

/// One pending load within a batch: the parent object value and the field
/// arguments it was requested with.
#[derive(Clone)]
pub struct LoadRequest {
    pub parent: Arc<serde_json::Value>,
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl LoadRequest {
    pub fn argument(&self, name: &str) -> Option<&serde_json::Value> {
        self.arguments.get(name)
    }
}

pub type BatchFuture = BoxFuture<'static, GraphqlResult<Vec<GraphqlResult<serde_json::Value>>>>;

/// A batch function receives every load collected during one execution turn
/// and must return exactly one result per request, in request order.
pub trait BatchFn: Send + Sync {
    fn load(&self, requests: Vec<LoadRequest>) -> BatchFuture;
}

impl<F, Fut> BatchFn for F
where
    F: Fn(Vec<LoadRequest>) -> Fut + Send + Sync,
    Fut: Future<Output = GraphqlResult<Vec<GraphqlResult<serde_json::Value>>>> + Send + 'static,
{
    fn load(&self, requests: Vec<LoadRequest>) -> BatchFuture {
        Box::pin(self(requests))
    }
}

pub(crate) struct LoaderDefinition {
    name: String,
    pub cache_results: bool,
    pub batch: Arc<dyn BatchFn>,
}

impl LoaderDefinition {
    /// `Type.field`, used in cache keys, logs and contract-violation
    /// messages.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Batched loaders keyed by the (type, field) coordinate they intercept. A
/// registered loader takes precedence over the field's schema binding.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: FxHashMap<(String, String), Arc<LoaderDefinition>>,
}

impl LoaderRegistry {
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        field_name: impl Into<String>,
        cache_results: bool,
        batch: impl BatchFn + 'static,
    ) {
        let type_name = type_name.into();
        let field_name = field_name.into();
        let definition = LoaderDefinition {
            name: format!("{type_name}.{field_name}"),
            cache_results,
            batch: Arc::new(batch),
        };
        self.loaders.insert((type_name, field_name), Arc::new(definition));
    }

    pub(crate) fn get(&self, type_name: &str, field_name: &str) -> Option<&Arc<LoaderDefinition>> {
        // A tuple key cannot be queried with borrowed strs; lookups only
        // happen while lowering an operation, so the allocation is fine.
        self.loaders.get(&(type_name.to_string(), field_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }
}
