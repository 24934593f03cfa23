pub mod listener;
pub mod memory_broadcaster;
pub mod redis_broadcaster;

pub use listener::{spawn_invalidation_listener, spawn_local_invalidation_listener};
pub use memory_broadcaster::{InMemoryBroadcaster, Published};
pub use redis_broadcaster::RedisBroadcaster;

use async_trait::async_trait;

use crate::error::AppResult;

/// Event carrying one hosting cache key (a host or a `^`-prefixed pattern)
pub const EVENT_INVALIDATE_HOSTING_CACHE: &str = "invalidate_hosting_cache";

/// Redis channel prefix; events are published on `hostplane:events:<event>`
pub const CHANNEL_PREFIX: &str = "hostplane:events:";

pub fn channel_for(event: &str) -> String {
    format!("{}{}", CHANNEL_PREFIX, event)
}

/// Pub/sub backend for cache events
#[async_trait]
pub trait CacheBroadcaster: Send + Sync {
    /// Publish `key` to every subscriber of `event`
    async fn broadcast(&self, event: &str, key: &str) -> AppResult<()>;
}
