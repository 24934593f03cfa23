use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};

use crate::error::{AppError, AppResult};
use crate::pubsub::CacheBroadcaster;

const CHANNEL_CAPACITY: usize = 256;

/// A published (event, key) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub event: String,
    pub key: String,
}

/// In-process broadcaster for tests and single-node setups
#[derive(Clone)]
pub struct InMemoryBroadcaster {
    sender: broadcast::Sender<Published>,
    log: Arc<Mutex<Vec<Published>>>,
    failing: Arc<AtomicBool>,
}

impl InMemoryBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            log: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Published> {
        self.sender.subscribe()
    }

    /// Make every subsequent broadcast fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Keys published so far for an event, in order
    pub async fn published_keys(&self, event: &str) -> Vec<String> {
        self.log
            .lock()
            .await
            .iter()
            .filter(|p| p.event == event)
            .map(|p| p.key.clone())
            .collect()
    }
}

impl Default for InMemoryBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheBroadcaster for InMemoryBroadcaster {
    async fn broadcast(&self, event: &str, key: &str) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Broadcast("subscriber unavailable".to_string()));
        }

        let published = Published {
            event: event.to_string(),
            key: key.to_string(),
        };
        self.log.lock().await.push(published.clone());

        // No receivers is not an error for a fire-and-forget event
        let _ = self.sender.send(published);

        Ok(())
    }
}
