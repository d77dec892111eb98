mod config;
mod engine;
mod execution;
mod loader;
mod prepare;
mod response;

pub use config::{EngineConfig, PersistedQueryMode};
pub use engine::{cache::CacheKey, runtime::Runtime, Engine};
pub use graphloom_error::{ErrorCode, GraphqlError, GraphqlResult};
pub use graphloom_operation::{BatchRequest, Request};
pub use graphloom_schema::{AppContext, Schema};
pub use loader::{BatchFn, LoadRequest, LoaderRegistry};
pub use prepare::CachedOperation;
pub use response::{BatchResponse, Response, ResponseData};
