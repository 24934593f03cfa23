use serde::{Deserialize, Serialize};

use crate::models::{BuildConf, BuildManifest, CustomCert};

/// One joined row returned by a config query: an environment, one of its
/// deployments, and the owner data needed to resolve a hosting config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigRecord {
    pub app_id: i64,
    pub env_id: i64,
    pub env_name: String,
    pub display_name: String,
    pub deployment_id: i64,
    pub storage_location: Option<String>,
    pub function_location: Option<String>,
    pub api_location: Option<String>,
    pub build_manifest: Option<BuildManifest>,
    pub build_conf: BuildConf,
    pub percentage: f64,
    pub domain_id: Option<i64>,
    pub domain_name: Option<String>,
    pub custom_cert: Option<CustomCert>,
    pub owner_tier: Option<String>,
}
