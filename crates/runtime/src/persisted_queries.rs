/// Read-only store resolving persisted-document identifiers to query text.
#[async_trait::async_trait]
pub trait PersistedQueryStore: Send + Sync {
    async fn fetch(&self, doc_id: &str) -> Result<String, PersistedQueryStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PersistedQueryStoreError {
    #[error("persisted query not found")]
    DocumentNotFound,
    #[error("persisted query store failure: {0}")]
    RetrievalError(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// A store with no documents, for deployments without persisted queries.
pub struct NoPersistedQueries;

#[async_trait::async_trait]
impl PersistedQueryStore for NoPersistedQueries {
    async fn fetch(&self, _doc_id: &str) -> Result<String, PersistedQueryStoreError> {
        Err(PersistedQueryStoreError::DocumentNotFound)
    }
}
