use std::sync::Arc;

use indexmap::IndexMap;

use crate::{
    execution::executor::FieldTask,
    loader::{LoadRequest, LoaderDefinition},
};

/// Loads submitted during the current turn, grouped per loader in
/// first-submission order. Loaders with result caching dedupe identical keys
/// within the turn, so the underlying fetch sees each key at most once.
pub(crate) struct BatchCollector {
    batches: IndexMap<String, PendingBatch>,
}

pub(crate) struct PendingBatch {
    pub loader: Arc<LoaderDefinition>,
    pub entries: Vec<BatchEntry>,
}

pub(crate) struct BatchEntry {
    pub request: LoadRequest,
    pub cache_key: Option<String>,
    /// More than one task only when a cached key repeats within the turn.
    pub tasks: Vec<FieldTask>,
}

impl BatchCollector {
    pub fn new() -> Self {
        BatchCollector {
            batches: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn submit(
        &mut self,
        loader: Arc<LoaderDefinition>,
        request: LoadRequest,
        cache_key: Option<String>,
        task: FieldTask,
    ) {
        let batch = self
            .batches
            .entry(loader.name().to_string())
            .or_insert_with(|| PendingBatch {
                loader,
                entries: Vec::new(),
            });

        if let Some(key) = &cache_key {
            if let Some(entry) = batch
                .entries
                .iter_mut()
                .find(|entry| entry.cache_key.as_deref() == Some(key))
            {
                entry.tasks.push(task);
                return;
            }
        }

        batch.entries.push(BatchEntry {
            request,
            cache_key,
            tasks: vec![task],
        });
    }

    pub fn drain(&mut self) -> Vec<PendingBatch> {
        self.batches.drain(..).map(|(_, batch)| batch).collect()
    }
}
