pub(crate) mod cache;
pub(crate) mod runtime;

use std::sync::Arc;

use futures::future::join_all;
use graphloom_operation::{BatchRequest, Request};
use graphloom_runtime::operation_cache::OperationCache;
use graphloom_schema::{AppContext, Schema};
use tracing::Instrument;

use crate::{
    config::{EngineConfig, PersistedQueryMode},
    engine::cache::{CacheKey, DocumentKey},
    execution,
    loader::LoaderRegistry,
    prepare::CachedDocument,
    response::{BatchResponse, Response},
};

pub use runtime::Runtime;

pub struct Engine<R: Runtime> {
    pub(crate) schema: Arc<Schema>,
    pub(crate) loaders: LoaderRegistry,
    pub(crate) config: EngineConfig,
    pub runtime: R,
}

impl<R: Runtime> Engine<R> {
    pub fn new(schema: Arc<Schema>, loaders: LoaderRegistry, config: EngineConfig, runtime: R) -> Self {
        Engine {
            schema,
            loaders,
            config,
            runtime,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Whether raw query text is rejected in favor of persisted documents.
    /// HTTP layers use this to shape their error responses.
    pub fn persisted_only(&self) -> bool {
        self.config.persisted_queries == PersistedQueryMode::Required
    }

    pub async fn execute(&self, request: Request, app: AppContext) -> Response {
        let span = tracing::info_span!(
            "graphql",
            operation.name = request.operation_name.as_deref().unwrap_or_default()
        );
        async {
            let prepared = match self.prepare_operation(&request).await {
                Ok(prepared) => prepared,
                Err(response) => return response,
            };
            let response = execution::execute(&prepared, app).await;
            tracing::debug!(errors = response.errors().len(), "executed operation");
            response
        }
        .instrument(span)
        .await
    }

    /// Executes a batch envelope. Slots run concurrently against the shared
    /// application context, fail independently and come back in submission
    /// order.
    pub async fn execute_batch(&self, batch: BatchRequest, app: AppContext) -> BatchResponse {
        match batch {
            BatchRequest::Single(request) => BatchResponse::Single(self.execute(request, app).await),
            BatchRequest::Batch(requests) => BatchResponse::Batch(
                join_all(
                    requests
                        .into_iter()
                        .map(|request| self.execute(request, app.clone())),
                )
                .await,
            ),
        }
    }

    /// Seeds the plan cache with known documents, parsed, validated and
    /// compiled up front so their first real request is already hot. Invalid
    /// documents are skipped with a warning.
    pub async fn warm<'d>(&self, documents: impl IntoIterator<Item = &'d str>) {
        let mut count = 0usize;
        for document in documents {
            let cached = self.build_cached_operation(None, document);
            match &cached.document {
                CachedDocument::Valid { operation, .. } => {
                    match crate::prepare::compile(&self.schema, &self.loaders, operation) {
                        Ok(compiled) => cached.promote(Arc::new(compiled)),
                        Err(err) => {
                            tracing::warn!("Skipping warm document: {err}");
                            continue;
                        }
                    }
                }
                CachedDocument::Invalid(_) => {
                    tracing::warn!("Skipping invalid warm document");
                    continue;
                }
            }
            let key = CacheKey::document(
                &self.schema,
                &DocumentKey::Text {
                    operation_name: None,
                    document,
                },
            );
            self.runtime
                .operation_cache()
                .insert(key.into(), Arc::new(cached))
                .await;
            count += 1;
        }
        tracing::info!(count, "plan cache warmed");
    }
}
