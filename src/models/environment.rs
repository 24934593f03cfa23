use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::models::Redirect;

/// A named build configuration belonging to one application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    pub id: i64,
    pub app_id: i64,
    pub name: String, // e.g. "production", "staging"
    pub branch: String,
    pub auto_publish: bool,
    pub auto_deploy: bool,
    pub build_conf: BuildConf,
    pub updated_at: Option<OffsetDateTime>,
    pub deleted_at: Option<OffsetDateTime>,
}

impl Environment {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Environment-level configuration stored as JSON in `apps_build_conf.build_conf`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuildConf {
    pub build_cmd: Option<String>,
    pub dist_folder: Option<String>,
    pub vars: BTreeMap<String, String>,
    /// Redirects configured through the UI; these take precedence over
    /// the redirects shipped with a deployment.
    pub redirects: Vec<Redirect>,
    pub headers: Vec<HeaderRule>,
    pub api_folder: Option<String>,
    pub api_path_prefix: Option<String>,
    pub error_file: Option<String>,
    pub status_checks: Vec<StatusCheck>,
}

/// Custom response headers applied to every path matching `location`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRule {
    pub location: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCheck {
    pub name: String,
    pub cmd: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_conf_defaults() {
        let conf: BuildConf = serde_json::from_str("{}").unwrap();
        assert_eq!(conf, BuildConf::default());
    }

    #[test]
    fn test_build_conf_decoding() {
        let conf: BuildConf = serde_json::from_value(serde_json::json!({
            "vars": {"NODE_ENV": "production"},
            "redirects": [{"from": "/old", "to": "/new", "status": 301}],
            "apiPathPrefix": "/backend",
            "statusChecks": [{"name": "lint", "cmd": "npm run lint"}]
        }))
        .unwrap();

        assert_eq!(conf.vars.get("NODE_ENV").map(String::as_str), Some("production"));
        assert_eq!(conf.redirects.len(), 1);
        assert_eq!(conf.api_path_prefix.as_deref(), Some("/backend"));
        assert_eq!(conf.status_checks[0].name, "lint");
    }
}
