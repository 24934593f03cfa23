pub mod memory_store;

pub use memory_store::InMemoryStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{AffectedDomains, ConfigRecord, Environment, Snippet, TriggerWhen, Webhook};

/// Resolution strategy for a config lookup, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigFilter {
    /// Exact deployment preview (`<display>--<id>.<dev-domain>`)
    ByDeployment {
        display_name: String,
        deployment_id: i64,
    },
    /// Verified custom domain
    ByDomain { domain_name: String },
    /// Dev subdomain or token-authenticated lookup by environment name
    ByDisplayName {
        display_name: String,
        env_name: String,
    },
}

/// Config reads over deployments and their publish records
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// One record per matching (environment, deployment) pair.
    /// Returns an empty list when nothing matches.
    async fn find_configs(&self, filter: &ConfigFilter) -> AppResult<Vec<ConfigRecord>>;
}

#[async_trait]
pub trait DomainStore: Send + Sync {
    /// Names of the verified domains attached to an environment
    async fn verified_domain_names(&self, env_id: i64) -> AppResult<Vec<String>>;
}

#[async_trait]
pub trait EnvironmentStore: Send + Sync {
    /// Find an environment, including soft-deleted ones
    async fn find_environment(&self, env_id: i64) -> AppResult<Option<Environment>>;

    /// Display names of the apps owning the environment
    async fn display_names(&self, env_id: i64) -> AppResult<Vec<String>>;

    /// Soft delete an environment and unverify its domains in one transaction
    async fn delete_environment(&self, env_id: i64) -> AppResult<AffectedDomains>;
}

#[async_trait]
pub trait SnippetStore: Send + Sync {
    /// Enabled snippets of an environment in insertion order
    async fn enabled_snippets(&self, env_id: i64) -> AppResult<Vec<Snippet>>;
}

#[async_trait]
pub trait WebhookStore: Send + Sync {
    async fn webhooks_for(&self, app_id: i64, trigger: TriggerWhen) -> AppResult<Vec<Webhook>>;
}

/// Collaborator stores injected into the services
#[derive(Clone)]
pub struct Stores {
    pub deployments: Arc<dyn DeploymentStore>,
    pub domains: Arc<dyn DomainStore>,
    pub environments: Arc<dyn EnvironmentStore>,
    pub snippets: Arc<dyn SnippetStore>,
    pub webhooks: Arc<dyn WebhookStore>,
}

impl Stores {
    /// Use one in-memory store for every collaborator
    pub fn in_memory(store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            deployments: store.clone(),
            domains: store.clone(),
            environments: store.clone(),
            snippets: store.clone(),
            webhooks: store,
        }
    }
}
