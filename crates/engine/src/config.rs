/// Engine tunables. Every field has a default, so an empty config
/// deserializes to a working engine.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Number of uses after which a cached operation is compiled. 0 compiles
    /// on first use.
    pub compile_threshold: u32,
    /// Maximum selection-set nesting depth, fragments expanded.
    pub max_query_depth: usize,
    /// Upper bound on the byte length of an executable document.
    pub executable_document_limit_bytes: usize,
    pub persisted_queries: PersistedQueryMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            compile_threshold: 3,
            max_query_depth: 64,
            executable_document_limit_bytes: 32 * 1024,
            persisted_queries: PersistedQueryMode::Allowed,
        }
    }
}

/// Whether raw query text is accepted alongside persisted documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistedQueryMode {
    /// Raw text and persisted references are both accepted.
    #[default]
    Allowed,
    /// Only persisted references are accepted; raw text is rejected.
    Required,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.compile_threshold, 3);
        assert_eq!(config.max_query_depth, 64);
        assert_eq!(config.persisted_queries, PersistedQueryMode::Allowed);
    }

    #[test]
    fn persisted_query_mode_is_snake_case() {
        let config: EngineConfig = serde_json::from_str(r#"{"persisted_queries": "required"}"#).unwrap();
        assert_eq!(config.persisted_queries, PersistedQueryMode::Required);
    }
}
