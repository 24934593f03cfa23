use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager as RedisConnectionManager;
use sea_orm::{ConnectOptions, Database};
use sqlx::postgres::PgPool;

use crate::config::Config;
use crate::pubsub::{
    spawn_local_invalidation_listener, CacheBroadcaster, InMemoryBroadcaster, RedisBroadcaster,
};
use crate::repositories::sea_orm_stores;
use crate::services::{
    CacheInvalidator, ConfigResolver, HostingCache, HttpWebhookSender, WebhookSender,
};
use crate::store::Stores;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: Stores,
    pub resolver: ConfigResolver,
    pub invalidator: CacheInvalidator,
    /// Resolved configs per host, kept coherent by invalidation events
    pub cache: HostingCache,
}

impl AppState {
    /// Create a new AppState backed by PostgreSQL and Redis
    pub async fn new(config: Config) -> Result<Self, AppStateError> {
        // Connect to PostgreSQL with SQLx (for migrations)
        let pg_pool = PgPool::connect(&config.database_url)
            .await
            .map_err(|e| AppStateError::Postgres(e.to_string()))?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pg_pool)
            .await
            .map_err(|e| AppStateError::Migration(e.to_string()))?;
        pg_pool.close().await;

        // Connect to PostgreSQL with SeaORM
        let mut opt = ConnectOptions::new(&config.database_url);
        opt.max_connections(100)
            .min_connections(5)
            .sqlx_logging(true);

        let db = Database::connect(opt)
            .await
            .map_err(|e| AppStateError::Postgres(e.to_string()))?;

        // Connect to Redis
        let redis_client = redis::Client::open(config.redis_url.as_str())
            .map_err(|e| AppStateError::Redis(e.to_string()))?;
        let redis = RedisConnectionManager::new(redis_client)
            .await
            .map_err(|e| AppStateError::Redis(e.to_string()))?;

        let sender = HttpWebhookSender::new(Duration::from_secs(config.webhook_timeout_secs))
            .map_err(|e| AppStateError::Http(e.to_string()))?;

        Ok(Self::build(
            config,
            sea_orm_stores(db),
            Arc::new(RedisBroadcaster::new(redis)),
            Arc::new(sender),
        ))
    }

    /// Create AppState over the given stores with an in-process broadcaster
    /// (for testing and single-node setups)
    pub fn with_stores(
        config: Config,
        stores: Stores,
        broadcaster: InMemoryBroadcaster,
        sender: Arc<dyn WebhookSender>,
    ) -> Self {
        let state = Self::build(config, stores, Arc::new(broadcaster.clone()), sender);
        spawn_local_invalidation_listener(&broadcaster, state.cache.clone());
        state
    }

    fn build(
        config: Config,
        stores: Stores,
        broadcaster: Arc<dyn CacheBroadcaster>,
        sender: Arc<dyn WebhookSender>,
    ) -> Self {
        let config = Arc::new(config);

        Self {
            resolver: ConfigResolver::new(config.clone(), &stores),
            invalidator: CacheInvalidator::new(&stores, broadcaster, sender),
            cache: HostingCache::new(
                Duration::from_secs(config.cache_ttl_secs),
                config.cache_capacity,
            ),
            stores,
            config,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("PostgreSQL connection error: {0}")]
    Postgres(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Redis connection error: {0}")]
    Redis(String),

    #[error("HTTP client error: {0}")]
    Http(String),
}
