mod cached;
mod compile;
mod document;

pub use cached::CachedOperation;
pub(crate) use cached::CachedDocument;
pub(crate) use compile::{
    compile, ArgumentValue, CompiledArgument, CompiledField, CompiledOperation, FieldBinding, FieldId,
};

use std::sync::Arc;

use graphloom_error::{ErrorCode, GraphqlError};
use graphloom_operation::{Error as OperationError, ErrorKind, ParsedOperation, Request, Variables};
use graphloom_runtime::operation_cache::OperationCache;

use crate::{engine::cache::CacheKey, response::Response, Engine, Runtime};

/// Everything execution needs, with the cache entry kept alive alongside the
/// plan it came from.
pub(crate) struct PreparedOperation {
    pub cached: Arc<CachedOperation>,
    pub compiled: Arc<CompiledOperation>,
    pub variables: Variables,
}

impl<R: Runtime> Engine<R> {
    pub(crate) async fn prepare_operation(&self, request: &Request) -> Result<PreparedOperation, Response> {
        let key = document::document_key(self.config.persisted_queries, request)
            .map_err(|err| Response::request_error([err]))?;

        let cache_key = CacheKey::document(&self.schema, &key);
        let cached = match self.runtime.operation_cache().get(cache_key.as_ref()).await {
            Some(cached) => {
                tracing::debug!(outcome = "hit", "plan cache lookup");
                cached
            }
            None => {
                tracing::debug!(outcome = "miss", "plan cache lookup");
                let content = document::resolve_content(self.runtime.persisted_queries(), request, &key)
                    .await
                    .map_err(|err| Response::request_error([err]))?;
                let cached = Arc::new(self.build_cached_operation(request.operation_name.as_deref(), &content));
                self.runtime
                    .operation_cache()
                    .insert(cache_key.into(), cached.clone())
                    .await;
                cached
            }
        };
        let usage = cached.record_usage();

        let (operation, depth) = match &cached.document {
            CachedDocument::Valid { operation, depth } => (operation, *depth),
            CachedDocument::Invalid(errors) => {
                return Err(Response::request_error(errors.iter().cloned()));
            }
        };

        if depth > self.config.max_query_depth {
            let subject = match &operation.name {
                Some(name) => format!("Operation '{name}' depth {depth}"),
                None => format!("Query depth {depth}"),
            };
            return Err(Response::request_error([GraphqlError::new(
                format!("{subject} exceeds the configured maximum of {}.", self.config.max_query_depth),
                ErrorCode::QueryDepthExceeded,
            )]));
        }

        let compiled = match cached.compiled() {
            Some(compiled) => compiled,
            None => {
                // Cold path: lower transiently and throw the plan away,
                // unless this use crossed the promotion threshold.
                let compiled = Arc::new(
                    compile(&self.schema, &self.loaders, operation)
                        .map_err(|err| Response::request_error([err]))?,
                );
                if usage > self.config.compile_threshold {
                    cached.promote(compiled.clone());
                    tracing::debug!(usage, "operation promoted to a compiled plan");
                }
                compiled
            }
        };

        let variables = Variables::bind(&self.schema, operation, request.variables.clone())
            .map_err(|errors| Response::request_error(errors.into_iter().map(into_graphql_error)))?;

        Ok(PreparedOperation {
            cached,
            compiled,
            variables,
        })
    }

    pub(crate) fn build_cached_operation(&self, operation_name: Option<&str>, document: &str) -> CachedOperation {
        if document.len() > self.config.executable_document_limit_bytes {
            return CachedOperation::new(CachedDocument::Invalid(vec![GraphqlError::new(
                "Executable document exceeded the maximum configured size.",
                ErrorCode::OperationValidationError,
            )]));
        }

        match ParsedOperation::parse(&self.schema, operation_name, document) {
            Ok(operation) => {
                let depth = operation.depth();
                CachedOperation::new(CachedDocument::Valid { operation, depth })
            }
            Err(errors) => CachedOperation::new(CachedDocument::Invalid(
                errors.into_iter().map(into_graphql_error).collect(),
            )),
        }
    }
}

pub(crate) fn into_graphql_error(error: OperationError) -> GraphqlError {
    let code = match error.kind {
        ErrorKind::Parsing => ErrorCode::OperationParsingError,
        ErrorKind::Validation => ErrorCode::OperationValidationError,
        ErrorKind::OperationNotFound => ErrorCode::OperationNotFound,
        ErrorKind::Variable => ErrorCode::VariableError,
    };
    GraphqlError::new(error.message, code).with_locations(error.locations)
}
