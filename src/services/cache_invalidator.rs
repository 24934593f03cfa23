//! Hosting cache invalidation after configuration writes.

use std::sync::Arc;

use futures::future::join_all;

use crate::error::AppResult;
use crate::models::{CachePurgePayload, Snippet, TriggerWhen};
use crate::pubsub::{CacheBroadcaster, EVENT_INVALIDATE_HOSTING_CACHE};
use crate::services::snippets::calculate_reset_domains;
use crate::services::webhook::WebhookSender;
use crate::store::{DomainStore, EnvironmentStore, Stores, WebhookStore};

/// Cache key matching every dev host of an app: the default environment and
/// all `--<deployment-id>` previews.
pub fn dev_host_pattern(display_name: &str) -> String {
    format!("^{}(?:--\\d+)?", display_name)
}

#[derive(Clone)]
pub struct CacheInvalidator {
    domains: Arc<dyn DomainStore>,
    environments: Arc<dyn EnvironmentStore>,
    webhooks: Arc<dyn WebhookStore>,
    broadcaster: Arc<dyn CacheBroadcaster>,
    sender: Arc<dyn WebhookSender>,
}

impl CacheInvalidator {
    pub fn new(
        stores: &Stores,
        broadcaster: Arc<dyn CacheBroadcaster>,
        sender: Arc<dyn WebhookSender>,
    ) -> Self {
        Self {
            domains: stores.domains.clone(),
            environments: stores.environments.clone(),
            webhooks: stores.webhooks.clone(),
            broadcaster,
            sender,
        }
    }

    /// Keys derived from an environment: its verified domains and one
    /// dev host pattern per display name.
    pub async fn keys_for(&self, env_id: i64) -> AppResult<Vec<String>> {
        let mut keys = self.domains.verified_domain_names(env_id).await?;

        for display_name in self.environments.display_names(env_id).await? {
            let pattern = dev_host_pattern(&display_name);
            if !keys.contains(&pattern) {
                keys.push(pattern);
            }
        }

        Ok(keys)
    }

    /// Broadcast invalidations for `explicit_keys`, or for the keys derived
    /// from `env_id` when none are given, then fire the app's cache purge
    /// webhooks. Only a failure to derive keys is returned.
    pub async fn reset(&self, env_id: i64, explicit_keys: &[String]) -> AppResult<()> {
        let keys = if explicit_keys.is_empty() && env_id != 0 {
            self.keys_for(env_id).await?
        } else {
            explicit_keys.to_vec()
        };

        for key in &keys {
            if let Err(e) = self
                .broadcaster
                .broadcast(EVENT_INVALIDATE_HOSTING_CACHE, key)
                .await
            {
                tracing::warn!(env_id, key = %key, error = %e, "Cache invalidation broadcast failed");
            }
        }

        tracing::info!(env_id, keys = keys.len(), "Hosting cache reset");

        if env_id != 0 {
            self.dispatch_purge_webhooks(env_id).await;
        }

        Ok(())
    }

    /// Reset after a snippet mutation. Snippets without host rules reset the
    /// whole environment; host-restricted ones only their hosts.
    pub async fn reset_for_snippets(
        &self,
        env_id: i64,
        display_name: &str,
        snippets: &[Snippet],
    ) -> AppResult<()> {
        match calculate_reset_domains(display_name, snippets) {
            None => self.reset(env_id, &[]).await,
            Some(keys) if keys.is_empty() => Ok(()),
            Some(keys) => self.reset(env_id, &keys).await,
        }
    }

    async fn dispatch_purge_webhooks(&self, env_id: i64) {
        let env = match self.environments.find_environment(env_id).await {
            Ok(Some(env)) => env,
            Ok(None) => {
                tracing::warn!(env_id, "Skipping purge webhooks for unknown environment");
                return;
            }
            Err(e) => {
                tracing::error!(env_id, error = %e, "Failed to load environment for purge webhooks");
                return;
            }
        };

        let webhooks = match self
            .webhooks
            .webhooks_for(env.app_id, TriggerWhen::OnCachePurge)
            .await
        {
            Ok(webhooks) => webhooks,
            Err(e) => {
                tracing::error!(app_id = env.app_id, error = %e, "Failed to load purge webhooks");
                return;
            }
        };

        if webhooks.is_empty() {
            return;
        }

        let payload = CachePurgePayload {
            app_id: env.app_id,
            environment_name: env.name,
        };

        let results = join_all(webhooks.iter().map(|w| self.sender.send(w, &payload))).await;

        for (webhook, result) in webhooks.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(
                    webhook_id = webhook.id,
                    app_id = webhook.app_id,
                    error = %e,
                    "Cache purge webhook failed"
                );
            }
        }
    }
}
