//! Config resolution: hosting identity → deployment configs ready to serve.
//!
//! A resolution returns one [`HostingConfig`] per matching (environment,
//! deployment) pair. Percentages of the rows returned for a domain or an
//! environment are expected to sum to 100; enforcement belongs to the publish
//! path, the resolver only reports drift.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{ConfigRecord, CustomCert, Redirect, Snippet};
use crate::services::env_vars::{interpolate, SystemVars};
use crate::services::headers::{normalize_headers, CompiledHeaderRule};
use crate::services::host_parser::{parse_host, DevTarget, HostIdentity};
use crate::services::snippets::ResolvedSnippet;
use crate::store::{ConfigFilter, DeploymentStore, SnippetStore, Stores};

const FULL_ROLLOUT: f64 = 100.0;
const ROLLOUT_TOLERANCE: f64 = 0.01;

/// A fully resolved deployment config for one request host
#[derive(Debug, Clone)]
pub struct HostingConfig {
    pub app_id: i64,
    pub env_id: i64,
    pub env_name: String,
    pub display_name: String,
    pub deployment_id: i64,
    pub percentage: f64,
    pub storage_location: Option<String>,
    pub function_location: Option<String>,
    pub api_location: Option<String>,
    pub api_path_prefix: String,
    pub domain_id: Option<i64>,
    pub domain_name: Option<String>,
    pub custom_cert: Option<CustomCert>,
    pub env_vars: BTreeMap<String, String>,
    pub snippets: Vec<ResolvedSnippet>,
    /// Environment redirects first, then the deployment's own
    pub redirects: Vec<Redirect>,
    /// Normalized response headers per static file
    pub static_files: BTreeMap<String, BTreeMap<String, String>>,
    /// Environment header rules, applied on top of the static file headers
    pub header_rules: Vec<CompiledHeaderRule>,
    pub error_file: Option<String>,
    pub is_enterprise: bool,
}

/// Sum of the rollout percentages of a resolution
pub fn rollout_total(configs: &[HostingConfig]) -> f64 {
    configs.iter().map(|c| c.percentage).sum()
}

/// Pick the config serving a request given a uniform `roll` in `[0, 1)`.
///
/// Weights are the configs' percentages. A set whose percentages are all zero
/// (an unpublished deployment preview) serves its first config.
pub fn pick_weighted(configs: &[HostingConfig], roll: f64) -> Option<&HostingConfig> {
    let total = rollout_total(configs);
    if total <= 0.0 {
        return configs.first();
    }

    let target = roll.clamp(0.0, 1.0) * total;
    let mut cumulative = 0.0;
    for config in configs {
        cumulative += config.percentage.max(0.0);
        if target < cumulative {
            return Some(config);
        }
    }

    configs.iter().rev().find(|c| c.percentage > 0.0)
}

#[derive(Clone)]
pub struct ConfigResolver {
    config: Arc<Config>,
    deployments: Arc<dyn DeploymentStore>,
    snippets: Arc<dyn SnippetStore>,
}

impl ConfigResolver {
    pub fn new(config: Arc<Config>, stores: &Stores) -> Self {
        Self {
            config,
            deployments: stores.deployments.clone(),
            snippets: stores.snippets.clone(),
        }
    }

    /// Query strategy for a parsed host; `None` when the host can never match
    pub fn filter_for(&self, identity: &HostIdentity) -> Option<ConfigFilter> {
        match identity {
            HostIdentity::CustomDomain { domain_name } => Some(ConfigFilter::ByDomain {
                domain_name: domain_name.clone(),
            }),
            HostIdentity::DevDomain {
                display_name,
                target,
            } => Some(match target {
                DevTarget::Deployment(id) => ConfigFilter::ByDeployment {
                    display_name: display_name.clone(),
                    deployment_id: *id,
                },
                DevTarget::Environment(env_name) => ConfigFilter::ByDisplayName {
                    display_name: display_name.clone(),
                    env_name: env_name.clone(),
                },
                DevTarget::Default => ConfigFilter::ByDisplayName {
                    display_name: display_name.clone(),
                    env_name: self.config.default_env_name.clone(),
                },
            }),
            HostIdentity::Unroutable => None,
        }
    }

    /// Parse a `Host` header and resolve it
    pub async fn resolve_host(&self, raw_host: &str) -> AppResult<Vec<HostingConfig>> {
        let identity = parse_host(raw_host, &self.config.dev_domain);

        let Some(filter) = self.filter_for(&identity) else {
            tracing::debug!(host = %raw_host, "Host is not routable");
            return Ok(Vec::new());
        };

        let Some(host) = identity.to_host(&self.config.dev_domain) else {
            return Ok(Vec::new());
        };

        self.resolve(&filter, &host, identity.is_dev_domain()).await
    }

    /// Run one query strategy and resolve every returned row.
    /// `host` is the request host snippets are matched against.
    pub async fn resolve(
        &self,
        filter: &ConfigFilter,
        host: &str,
        is_dev_host: bool,
    ) -> AppResult<Vec<HostingConfig>> {
        let records = self.deployments.find_configs(filter).await?;
        if records.is_empty() {
            return Ok(Vec::new());
        }

        // Rows of one resolution normally share an environment
        let mut snippets_by_env: HashMap<i64, Vec<ResolvedSnippet>> = HashMap::new();
        for env_id in records.iter().map(|r| r.env_id) {
            if snippets_by_env.contains_key(&env_id) {
                continue;
            }
            let snippets = self.snippets.enabled_snippets(env_id).await?;
            snippets_by_env.insert(env_id, attach_snippets(&snippets, host, is_dev_host));
        }

        let configs: Vec<HostingConfig> = records
            .into_iter()
            .map(|record| {
                let snippets = snippets_by_env
                    .get(&record.env_id)
                    .cloned()
                    .unwrap_or_default();
                self.hosting_config(record, snippets)
            })
            .collect();

        if !matches!(filter, ConfigFilter::ByDeployment { .. }) {
            let total = rollout_total(&configs);
            if (total - FULL_ROLLOUT).abs() > ROLLOUT_TOLERANCE {
                tracing::warn!(
                    env_id = configs[0].env_id,
                    total,
                    "Published percentages do not sum to 100"
                );
            }
        }

        Ok(configs)
    }

    fn hosting_config(&self, record: ConfigRecord, snippets: Vec<ResolvedSnippet>) -> HostingConfig {
        let system = SystemVars {
            app_id: record.app_id,
            env_id: record.env_id,
            env_name: &record.env_name,
            deployment_id: record.deployment_id,
            display_name: &record.display_name,
            dev_domain: &self.config.dev_domain,
            default_env_name: &self.config.default_env_name,
        }
        .to_map();
        let env_vars = interpolate(&system, &record.build_conf.vars);

        let manifest = record.build_manifest.unwrap_or_default();
        let mut redirects = record.build_conf.redirects;
        redirects.extend(manifest.redirects);

        let api_path_prefix = record
            .build_conf
            .api_path_prefix
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| self.config.api_path_prefix.clone());

        HostingConfig {
            app_id: record.app_id,
            env_id: record.env_id,
            env_name: record.env_name,
            display_name: record.display_name,
            deployment_id: record.deployment_id,
            percentage: record.percentage,
            storage_location: record.storage_location,
            function_location: record.function_location,
            api_location: record.api_location,
            api_path_prefix,
            domain_id: record.domain_id,
            domain_name: record.domain_name,
            custom_cert: record.custom_cert,
            env_vars,
            snippets,
            redirects,
            static_files: normalize_headers(&manifest.cdn_files),
            header_rules: record
                .build_conf
                .headers
                .iter()
                .filter_map(CompiledHeaderRule::compile)
                .collect(),
            error_file: record.build_conf.error_file,
            is_enterprise: self.config.is_enterprise(record.owner_tier.as_deref()),
        }
    }
}

fn attach_snippets(snippets: &[Snippet], host: &str, is_dev_host: bool) -> Vec<ResolvedSnippet> {
    snippets
        .iter()
        .filter(|s| s.enabled && s.applies_to_host(host, is_dev_host))
        .map(ResolvedSnippet::compile)
        .collect()
}
