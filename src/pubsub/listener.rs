use std::time::Duration;

use futures::StreamExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::error::AppResult;
use crate::pubsub::{channel_for, InMemoryBroadcaster, EVENT_INVALIDATE_HOSTING_CACHE};
use crate::services::HostingCache;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Subscribe to hosting cache invalidations and apply them to the local cache.
/// Reconnects after a fixed delay whenever the subscription drops.
pub fn spawn_invalidation_listener(client: redis::Client, cache: HostingCache) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match listen(&client, &cache).await {
                Ok(()) => tracing::warn!("Invalidation subscription closed"),
                Err(e) => tracing::error!(error = %e, "Invalidation listener failed"),
            }

            // Anything published while disconnected is lost
            cache.clear();
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    })
}

async fn listen(client: &redis::Client, cache: &HostingCache) -> AppResult<()> {
    let mut pubsub = client.get_async_pubsub().await?;
    pubsub
        .subscribe(channel_for(EVENT_INVALIDATE_HOSTING_CACHE))
        .await?;

    tracing::info!("Listening for hosting cache invalidations");

    let mut messages = pubsub.on_message();
    while let Some(msg) = messages.next().await {
        match msg.get_payload::<String>() {
            Ok(key) => {
                let removed = cache.invalidate(&key);
                tracing::debug!(key = %key, removed, "Hosting cache invalidated");
            }
            Err(e) => tracing::warn!(error = %e, "Ignoring malformed invalidation message"),
        }
    }

    Ok(())
}

/// Apply invalidations published through an in-process broadcaster
pub fn spawn_local_invalidation_listener(
    broadcaster: &InMemoryBroadcaster,
    cache: HostingCache,
) -> JoinHandle<()> {
    let mut rx = broadcaster.subscribe();

    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(published) if published.event == EVENT_INVALIDATE_HOSTING_CACHE => {
                    cache.invalidate(&published.key);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Invalidation listener lagged, clearing cache");
                    cache.clear();
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
