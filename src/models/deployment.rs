use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::Redirect;

/// One immutable build artifact produced for an environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deployment {
    pub id: i64,
    pub env_id: i64,
    pub app_id: i64,
    pub storage_location: Option<String>,
    pub function_location: Option<String>,
    pub api_location: Option<String>,
    pub build_manifest: Option<BuildManifest>,
    pub exit_code: Option<i32>,
}

/// Manifest produced by the build pipeline (JSON column `build_manifest`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildManifest {
    pub cdn_files: Vec<CdnFile>,
    pub redirects: Vec<Redirect>,
    pub function_handler: Option<String>,
    pub api_handler: Option<String>,
}

/// A static file served from storage, with explicit headers if any
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CdnFile {
    pub name: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// A traffic share assigned to a deployment within an environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedInfo {
    pub deployment_id: i64,
    pub env_id: i64,
    pub percentage: f64,
}
