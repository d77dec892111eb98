use std::borrow::Cow;

use graphloom_error::{ErrorCode, GraphqlError};
use graphloom_operation::Request;
use graphloom_runtime::persisted_queries::{PersistedQueryStore, PersistedQueryStoreError};
use sha2::{Digest, Sha256};

use crate::{config::PersistedQueryMode, engine::cache::DocumentKey};

/// Decides what the request designates its document by, without touching the
/// persisted query store. The plan cache is consulted on this key first;
/// content is only resolved on a miss.
pub(crate) fn document_key(mode: PersistedQueryMode, request: &Request) -> Result<DocumentKey<'_>, GraphqlError> {
    let operation_name = request.operation_name.as_deref();
    let query = raw_query(request);

    if let Some(ext) = &request.extensions.persisted_query {
        if ext.version != 1 {
            return Err(GraphqlError::new(
                format!("Persisted query version {} is not supported.", ext.version),
                ErrorCode::PersistedQueryError,
            ));
        }
        if mode == PersistedQueryMode::Required && query.is_some() {
            return Err(persisted_only_error());
        }
        return Ok(DocumentKey::AutomaticPersistedQuery {
            operation_name,
            sha256_hash: &ext.sha256_hash,
        });
    }

    if let Some(doc_id) = request.doc_id.as_deref() {
        if mode == PersistedQueryMode::Required && query.is_some() {
            return Err(persisted_only_error());
        }
        return Ok(DocumentKey::PersistedDocumentId { operation_name, doc_id });
    }

    match query {
        Some(document) if mode == PersistedQueryMode::Allowed => Ok(DocumentKey::Text {
            operation_name,
            document,
        }),
        Some(_) => Err(persisted_only_error()),
        None => Err(GraphqlError::new("Missing query", ErrorCode::BadRequest)),
    }
}

/// Resolves the document text behind a key, on a plan cache miss. Automatic
/// persisted queries accept inline text as registration, after checking it
/// hashes to what the client claims; otherwise the store is asked.
pub(crate) async fn resolve_content<'r>(
    store: &dyn PersistedQueryStore,
    request: &'r Request,
    key: &DocumentKey<'r>,
) -> Result<Cow<'r, str>, GraphqlError> {
    match key {
        DocumentKey::Text { document, .. } => Ok(Cow::Borrowed(document)),
        DocumentKey::AutomaticPersistedQuery { sha256_hash, .. } => {
            if let Some(query) = raw_query(request) {
                let digest = hex::encode(Sha256::digest(query.as_bytes()));
                if !digest.eq_ignore_ascii_case(sha256_hash) {
                    return Err(GraphqlError::new(
                        "Persisted query hash does not match the provided document.",
                        ErrorCode::PersistedQueryError,
                    ));
                }
                return Ok(Cow::Borrowed(query));
            }
            match store.fetch(sha256_hash).await {
                Ok(content) => Ok(Cow::Owned(content)),
                Err(PersistedQueryStoreError::DocumentNotFound) => Err(GraphqlError::new(
                    "Persisted query not found.",
                    ErrorCode::PersistedQueryNotFound,
                )),
                Err(PersistedQueryStoreError::RetrievalError(err)) => {
                    tracing::error!("Persisted query store failure: {err}");
                    Err(GraphqlError::internal_server_error())
                }
            }
        }
        DocumentKey::PersistedDocumentId { doc_id, .. } => match store.fetch(doc_id).await {
            Ok(content) => Ok(Cow::Owned(content)),
            Err(PersistedQueryStoreError::DocumentNotFound) => Err(GraphqlError::new(
                format!("Unknown document id: '{doc_id}'"),
                ErrorCode::PersistedQueryError,
            )),
            Err(PersistedQueryStoreError::RetrievalError(err)) => {
                tracing::error!("Persisted query store failure: {err}");
                Err(GraphqlError::internal_server_error())
            }
        },
    }
}

fn raw_query(request: &Request) -> Option<&str> {
    request.query.as_deref().filter(|query| !query.is_empty())
}

fn persisted_only_error() -> GraphqlError {
    GraphqlError::new(
        "Only persisted queries are accepted by this endpoint.",
        ErrorCode::PersistedQueryError,
    )
}
