use async_trait::async_trait;
use redis::aio::ConnectionManager as RedisConnectionManager;
use redis::AsyncCommands;

use crate::error::AppResult;
use crate::pubsub::{channel_for, CacheBroadcaster};

/// Redis PUBLISH-backed broadcaster
#[derive(Clone)]
pub struct RedisBroadcaster {
    conn: RedisConnectionManager,
}

impl RedisBroadcaster {
    pub fn new(conn: RedisConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CacheBroadcaster for RedisBroadcaster {
    async fn broadcast(&self, event: &str, key: &str) -> AppResult<()> {
        let mut conn = self.conn.clone();
        let receivers: i64 = conn.publish(channel_for(event), key).await?;

        tracing::debug!(event, key, receivers, "Cache event published");

        Ok(())
    }
}
