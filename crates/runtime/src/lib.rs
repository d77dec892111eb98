pub mod operation_cache;
pub mod persisted_queries;
