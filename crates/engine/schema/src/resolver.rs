use std::{any::Any, sync::Arc};

use futures::future::BoxFuture;
use graphloom_error::GraphqlResult;

/// Opaque per-request application context, produced by the caller and handed
/// to every resolver invocation. The engine never looks inside it.
pub type AppContext = Arc<dyn Any + Send + Sync>;

pub type ResolverFuture = BoxFuture<'static, GraphqlResult<serde_json::Value>>;

/// Everything a resolver invocation sees. Owned so resolver futures are
/// `'static`; parent values are shared, not copied.
pub struct ResolverInput {
    pub parent: Arc<serde_json::Value>,
    pub arguments: serde_json::Map<String, serde_json::Value>,
    pub app: AppContext,
}

impl ResolverInput {
    pub fn argument(&self, name: &str) -> Option<&serde_json::Value> {
        self.arguments.get(name)
    }
}

pub trait ResolverFn: Send + Sync {
    fn resolve(&self, input: ResolverInput) -> ResolverFuture;
}

impl<F, Fut> ResolverFn for F
where
    F: Fn(ResolverInput) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = GraphqlResult<serde_json::Value>> + Send + 'static,
{
    fn resolve(&self, input: ResolverInput) -> ResolverFuture {
        Box::pin(self(input))
    }
}

/// How a field obtains its value. Loader interception happens in the engine:
/// a registered (type, field) loader takes precedence over the binding here.
#[derive(Clone)]
pub enum ResolverBinding {
    /// Read the same-named property off the parent object value.
    Property,
    Resolve(Arc<dyn ResolverFn>),
}

impl std::fmt::Debug for ResolverBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolverBinding::Property => f.write_str("Property"),
            ResolverBinding::Resolve(_) => f.write_str("Resolve(..)"),
        }
    }
}
