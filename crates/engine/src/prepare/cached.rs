use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, OnceLock,
};

use graphloom_error::GraphqlError;
use graphloom_operation::ParsedOperation;

use crate::prepare::compile::CompiledOperation;

/// One plan cache entry: the validated document (or the errors it produced,
/// cached so repeated bad traffic fails without re-validating), a usage
/// counter and, once promoted, the compiled form.
pub struct CachedOperation {
    pub(crate) document: CachedDocument,
    usage: AtomicU32,
    compiled: OnceLock<Arc<CompiledOperation>>,
}

pub(crate) enum CachedDocument {
    Valid {
        operation: ParsedOperation,
        /// Computed once at parse time; checked against the configured limit
        /// on every use.
        depth: usize,
    },
    Invalid(Vec<GraphqlError>),
}

impl CachedOperation {
    pub(crate) fn new(document: CachedDocument) -> Self {
        CachedOperation {
            document,
            usage: AtomicU32::new(0),
            compiled: OnceLock::new(),
        }
    }

    /// Bumps the usage counter and returns the new count. Relaxed ordering:
    /// a racing request missing one increment only delays promotion by one
    /// use.
    pub(crate) fn record_usage(&self) -> u32 {
        self.usage.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn usage_count(&self) -> u32 {
        self.usage.load(Ordering::Relaxed)
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }

    pub(crate) fn compiled(&self) -> Option<Arc<CompiledOperation>> {
        self.compiled.get().cloned()
    }

    /// Attaches the compiled form. Concurrent promotions race benignly; the
    /// first wins and the rest drop their copy.
    pub(crate) fn promote(&self, compiled: Arc<CompiledOperation>) {
        let _ = self.compiled.set(compiled);
    }
}
