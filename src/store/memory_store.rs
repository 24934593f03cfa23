use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::models::{
    AffectedDomains, App, ConfigRecord, Deployment, Domain, Environment, PublishedInfo, Snippet,
    TriggerWhen, Webhook,
};
use crate::store::{
    ConfigFilter, DeploymentStore, DomainStore, EnvironmentStore, SnippetStore, WebhookStore,
};

/// In-memory store for unit testing and local development
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<InMemoryStoreInner>>,
    unavailable: Arc<AtomicBool>,
}

#[derive(Default)]
struct InMemoryStoreInner {
    apps: Vec<App>,
    environments: Vec<Environment>,
    deployments: Vec<Deployment>,
    published: Vec<PublishedInfo>,
    domains: Vec<Domain>,
    snippets: Vec<Snippet>,
    webhooks: Vec<Webhook>,
}

impl InMemoryStoreInner {
    fn record(
        &self,
        app: &App,
        env: &Environment,
        deployment: &Deployment,
        percentage: f64,
        domain: Option<&Domain>,
    ) -> ConfigRecord {
        ConfigRecord {
            app_id: app.id,
            env_id: env.id,
            env_name: env.name.clone(),
            display_name: app.display_name.clone(),
            deployment_id: deployment.id,
            storage_location: deployment.storage_location.clone(),
            function_location: deployment.function_location.clone(),
            api_location: deployment.api_location.clone(),
            build_manifest: deployment.build_manifest.clone(),
            build_conf: env.build_conf.clone(),
            percentage,
            domain_id: domain.map(|d| d.id),
            domain_name: domain.map(|d| d.name.clone()),
            custom_cert: domain.and_then(|d| d.custom_cert.clone()),
            owner_tier: app.owner_tier.clone(),
        }
    }

    fn app(&self, app_id: i64) -> Option<&App> {
        self.apps.iter().find(|a| a.id == app_id)
    }

    fn live_env(&self, env_id: i64) -> Option<&Environment> {
        self.environments
            .iter()
            .find(|e| e.id == env_id && !e.is_deleted())
    }

    /// One record per published deployment of the environment
    fn published_records(
        &self,
        app: &App,
        env: &Environment,
        domain: Option<&Domain>,
    ) -> Vec<ConfigRecord> {
        let mut rows: Vec<&PublishedInfo> =
            self.published.iter().filter(|p| p.env_id == env.id).collect();
        rows.sort_by_key(|p| p.deployment_id);

        rows.into_iter()
            .filter_map(|p| {
                self.deployments
                    .iter()
                    .find(|d| d.id == p.deployment_id)
                    .map(|d| self.record(app, env, d, p.percentage, domain))
            })
            .collect()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail like an unreachable database
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Database("connection refused".to_string()));
        }
        Ok(())
    }

    pub async fn insert_app(&self, app: App) {
        self.inner.lock().await.apps.push(app);
    }

    pub async fn insert_environment(&self, env: Environment) {
        self.inner.lock().await.environments.push(env);
    }

    pub async fn insert_deployment(&self, deployment: Deployment) {
        self.inner.lock().await.deployments.push(deployment);
    }

    /// Replace the publish rows of an environment
    pub async fn publish(&self, env_id: i64, rows: &[(i64, f64)]) {
        let mut inner = self.inner.lock().await;
        inner.published.retain(|p| p.env_id != env_id);
        inner
            .published
            .extend(rows.iter().map(|(deployment_id, percentage)| PublishedInfo {
                deployment_id: *deployment_id,
                env_id,
                percentage: *percentage,
            }));
    }

    pub async fn insert_domain(&self, domain: Domain) {
        self.inner.lock().await.domains.push(domain);
    }

    pub async fn insert_snippet(&self, snippet: Snippet) {
        self.inner.lock().await.snippets.push(snippet);
    }

    pub async fn insert_webhook(&self, webhook: Webhook) {
        self.inner.lock().await.webhooks.push(webhook);
    }

    pub async fn find_domain(&self, name: &str) -> Option<Domain> {
        let inner = self.inner.lock().await;
        inner
            .domains
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .cloned()
    }
}

#[async_trait]
impl DeploymentStore for InMemoryStore {
    async fn find_configs(&self, filter: &ConfigFilter) -> AppResult<Vec<ConfigRecord>> {
        self.check_available()?;
        let inner = self.inner.lock().await;

        let records = match filter {
            ConfigFilter::ByDeployment {
                display_name,
                deployment_id,
            } => {
                let found = inner
                    .deployments
                    .iter()
                    .find(|d| d.id == *deployment_id)
                    .and_then(|d| inner.live_env(d.env_id).map(|env| (d, env)))
                    .and_then(|(d, env)| inner.app(env.app_id).map(|app| (d, env, app)))
                    .filter(|(_, _, app)| app.display_name == *display_name);

                match found {
                    Some((deployment, env, app)) => {
                        let percentage = inner
                            .published
                            .iter()
                            .find(|p| p.deployment_id == deployment.id && p.env_id == env.id)
                            .map(|p| p.percentage)
                            .unwrap_or(0.0);
                        vec![inner.record(app, env, deployment, percentage, None)]
                    }
                    None => Vec::new(),
                }
            }
            ConfigFilter::ByDomain { domain_name } => {
                let found = inner
                    .domains
                    .iter()
                    .find(|d| d.verified && d.name.eq_ignore_ascii_case(domain_name))
                    .and_then(|d| inner.live_env(d.env_id).map(|env| (d, env)))
                    .and_then(|(d, env)| inner.app(env.app_id).map(|app| (d, env, app)));

                match found {
                    Some((domain, env, app)) => inner.published_records(app, env, Some(domain)),
                    None => Vec::new(),
                }
            }
            ConfigFilter::ByDisplayName {
                display_name,
                env_name,
            } => {
                let found = inner
                    .apps
                    .iter()
                    .find(|a| a.display_name == *display_name)
                    .and_then(|app| {
                        inner
                            .environments
                            .iter()
                            .find(|e| e.app_id == app.id && e.name == *env_name && !e.is_deleted())
                            .map(|env| (app, env))
                    });

                match found {
                    Some((app, env)) => inner.published_records(app, env, None),
                    None => Vec::new(),
                }
            }
        };

        Ok(records)
    }
}

#[async_trait]
impl DomainStore for InMemoryStore {
    async fn verified_domain_names(&self, env_id: i64) -> AppResult<Vec<String>> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        Ok(inner
            .domains
            .iter()
            .filter(|d| d.env_id == env_id && d.verified)
            .map(|d| d.name.clone())
            .collect())
    }
}

#[async_trait]
impl EnvironmentStore for InMemoryStore {
    async fn find_environment(&self, env_id: i64) -> AppResult<Option<Environment>> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        Ok(inner.environments.iter().find(|e| e.id == env_id).cloned())
    }

    async fn display_names(&self, env_id: i64) -> AppResult<Vec<String>> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        let mut names: Vec<String> = inner
            .environments
            .iter()
            .filter(|e| e.id == env_id)
            .filter_map(|e| inner.app(e.app_id))
            .map(|a| a.display_name.clone())
            .collect();
        names.dedup();
        Ok(names)
    }

    async fn delete_environment(&self, env_id: i64) -> AppResult<AffectedDomains> {
        self.check_available()?;
        let mut inner = self.inner.lock().await;

        let env = inner
            .environments
            .iter_mut()
            .find(|e| e.id == env_id && !e.is_deleted())
            .ok_or_else(|| AppError::NotFound("Environment".to_string()))?;
        env.deleted_at = Some(time::OffsetDateTime::now_utc());
        let app_id = env.app_id;

        let mut domain_names = Vec::new();
        for domain in inner
            .domains
            .iter_mut()
            .filter(|d| d.env_id == env_id && d.verified)
        {
            domain.verified = false;
            domain.verified_at = None;
            domain_names.push(domain.name.clone());
        }

        Ok(AffectedDomains {
            env_id,
            app_id,
            domain_names,
        })
    }
}

#[async_trait]
impl SnippetStore for InMemoryStore {
    async fn enabled_snippets(&self, env_id: i64) -> AppResult<Vec<Snippet>> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        Ok(inner
            .snippets
            .iter()
            .filter(|s| s.env_id == env_id && s.enabled)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl WebhookStore for InMemoryStore {
    async fn webhooks_for(&self, app_id: i64, trigger: TriggerWhen) -> AppResult<Vec<Webhook>> {
        self.check_available()?;
        let inner = self.inner.lock().await;
        Ok(inner
            .webhooks
            .iter()
            .filter(|w| w.app_id == app_id && w.trigger_when == trigger)
            .cloned()
            .collect())
    }
}
