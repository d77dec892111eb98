use graphloom_schema::Schema;

/// What a request identifies its document by. The operation name is part of
/// the key: the same document executed under two names yields two plans.
pub(crate) enum DocumentKey<'a> {
    Text {
        operation_name: Option<&'a str>,
        document: &'a str,
    },
    PersistedDocumentId {
        operation_name: Option<&'a str>,
        doc_id: &'a str,
    },
    AutomaticPersistedQuery {
        operation_name: Option<&'a str>,
        sha256_hash: &'a str,
    },
}

/// Plan cache key. The schema version is baked in, so swapping the schema
/// orphans every existing entry; they age out through normal LRU pressure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub(crate) fn document(schema: &Schema, key: &DocumentKey<'_>) -> CacheKey {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&schema.version().as_u64().to_be_bytes());

        let (tag, operation_name, content) = match key {
            DocumentKey::Text {
                operation_name,
                document,
            } => (0u8, operation_name, *document),
            DocumentKey::PersistedDocumentId {
                operation_name,
                doc_id,
            } => (1u8, operation_name, *doc_id),
            DocumentKey::AutomaticPersistedQuery {
                operation_name,
                sha256_hash,
            } => (2u8, operation_name, *sha256_hash),
        };

        let operation_name = operation_name.unwrap_or("");
        hasher.update(&[tag]);
        // Length-prefixed so (name, content) pairs cannot collide by
        // shifting bytes between the two.
        hasher.update(&(operation_name.len() as u64).to_be_bytes());
        hasher.update(operation_name.as_bytes());
        hasher.update(content.as_bytes());

        CacheKey(format!(
            "op/v{}/{}",
            schema.version().as_u64(),
            hasher.finalize().to_hex()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> String {
        key.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}
