use fxhash::FxHashMap;
use graphloom_runtime::persisted_queries::{PersistedQueryStore, PersistedQueryStoreError};

/// Fixed in-memory document map, the usual shape for build-time-extracted
/// persisted queries.
#[derive(Default)]
pub struct StaticPersistedQueryStore {
    documents: FxHashMap<String, String>,
}

impl StaticPersistedQueryStore {
    pub fn insert(&mut self, doc_id: impl Into<String>, document: impl Into<String>) {
        self.documents.insert(doc_id.into(), document.into());
    }
}

impl FromIterator<(String, String)> for StaticPersistedQueryStore {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        StaticPersistedQueryStore {
            documents: iter.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl PersistedQueryStore for StaticPersistedQueryStore {
    async fn fetch(&self, doc_id: &str) -> Result<String, PersistedQueryStoreError> {
        self.documents
            .get(doc_id)
            .cloned()
            .ok_or(PersistedQueryStoreError::DocumentNotFound)
    }
}
