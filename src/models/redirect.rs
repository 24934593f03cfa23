use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A redirect/rewrite/proxy rule, either configured in the UI for an
/// environment or shipped inside a deployment's build manifest.
///
/// `from` and `to` support a single `*` wildcard or `$1`-style capture
/// group references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub assets: bool,
}

impl Redirect {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            status: None,
            hosts: Vec::new(),
            headers: BTreeMap::new(),
            assets: false,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_hosts(mut self, hosts: &[&str]) -> Self {
        self.hosts = hosts.iter().map(|h| h.to_string()).collect();
        self
    }

    pub fn with_assets(mut self) -> Self {
        self.assets = true;
        self
    }
}
