pub mod cache;
pub mod environment;
pub mod hosting;

pub use cache::{reset_cache, CacheResetRequest};
pub use environment::{delete_environment, DeleteEnvironmentResponse};
pub use hosting::{lookup, LookupConfig, LookupParams, LookupResponse};
