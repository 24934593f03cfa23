use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use tokio::sync::Mutex;

use hostplane::build_router;
use hostplane::config::{Config, LogFormat};
use hostplane::error::{AppError, AppResult};
use hostplane::models::{CachePurgePayload, Webhook};
use hostplane::pubsub::{InMemoryBroadcaster, EVENT_INVALIDATE_HOSTING_CACHE};
use hostplane::services::WebhookSender;
use hostplane::state::AppState;
use hostplane::store::{InMemoryStore, Stores};

/// Test configuration
pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        redis_url: String::new(),
        dev_domain: "hostplane.dev".to_string(),
        default_env_name: "production".to_string(),
        api_path_prefix: "/api".to_string(),
        self_hosted: false,
        license_edition: None,
        cache_ttl_secs: 300,
        cache_capacity: 1_000,
        webhook_timeout_secs: 1,
        host: "127.0.0.1".to_string(),
        port: 0,
        log_format: LogFormat::Pretty,
    }
}

/// Webhook sender recording deliveries instead of sending them
#[derive(Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(i64, CachePurgePayload)>>,
    failing: std::sync::atomic::AtomicBool,
}

#[allow(dead_code)]
impl RecordingSender {
    pub async fn sent(&self) -> Vec<(i64, CachePurgePayload)> {
        self.sent.lock().await.clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }
}

#[async_trait]
impl WebhookSender for RecordingSender {
    async fn send(&self, webhook: &Webhook, payload: &CachePurgePayload) -> AppResult<()> {
        if self.failing.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(AppError::Webhook("connection refused".to_string()));
        }
        self.sent.lock().await.push((webhook.id, payload.clone()));
        Ok(())
    }
}

/// Test application wrapper
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub store: InMemoryStore,
    pub broadcaster: InMemoryBroadcaster,
    pub sender: Arc<RecordingSender>,
}

#[allow(dead_code)]
impl TestApp {
    /// Create a new test application over in-memory stores
    pub async fn new() -> Self {
        let store = InMemoryStore::new();
        let broadcaster = InMemoryBroadcaster::new();
        let sender = Arc::new(RecordingSender::default());

        let state = AppState::with_stores(
            test_config(),
            Stores::in_memory(store.clone()),
            broadcaster.clone(),
            sender.clone(),
        );

        let router = build_router(state.clone());
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            state,
            store,
            broadcaster,
            sender,
        }
    }

    /// Keys broadcast for hosting cache invalidation so far
    pub async fn invalidated_keys(&self) -> Vec<String> {
        self.broadcaster
            .published_keys(EVENT_INVALIDATE_HOSTING_CACHE)
            .await
    }

    /// Wait for the invalidation listener to evict `host` from the local cache
    pub async fn wait_until_evicted(&self, host: &str) {
        for _ in 0..100 {
            if self.state.cache.get(host).is_none() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} was never evicted from the hosting cache", host);
    }
}
