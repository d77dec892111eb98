use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing token identifying one built schema. Plan-cache
/// keys embed it, so replacing the schema makes every cached plan
/// unreachable at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaVersion(u64);

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

impl SchemaVersion {
    pub(crate) fn next() -> Self {
        SchemaVersion(NEXT_VERSION.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
