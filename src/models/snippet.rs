use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Sentinel host meaning "every generated dev subdomain".
pub const DEV_HOSTS_SENTINEL: &str = "*.dev";

/// Where a snippet is injected in the served HTML document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnippetLocation {
    Head,
    Body,
}

impl SnippetLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnippetLocation::Head => "head",
            SnippetLocation::Body => "body",
        }
    }
}

impl fmt::Display for SnippetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnippetLocation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "head" => Ok(SnippetLocation::Head),
            "body" => Ok(SnippetLocation::Body),
            other => Err(AppError::Validation(format!(
                "Invalid snippet location: {}",
                other
            ))),
        }
    }
}

/// Optional restriction on where a snippet applies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnippetRule {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snippet {
    pub id: i64,
    pub app_id: i64,
    pub env_id: i64,
    pub title: String,
    pub content: String,
    pub location: SnippetLocation,
    pub prepend: bool,
    pub enabled: bool,
    pub rules: Option<SnippetRule>,
}

impl Snippet {
    /// Hosts the snippet is restricted to; empty means every host.
    pub fn hosts(&self) -> &[String] {
        self.rules.as_ref().map(|r| r.hosts.as_slice()).unwrap_or(&[])
    }

    pub fn path_rule(&self) -> Option<&str> {
        self.rules
            .as_ref()
            .and_then(|r| r.path.as_deref())
            .filter(|p| !p.is_empty())
    }

    /// Whether the snippet should be attached to a response for `host`.
    pub fn applies_to_host(&self, host: &str, is_dev_host: bool) -> bool {
        let hosts = self.hosts();

        hosts.is_empty()
            || hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
            || (is_dev_host && hosts.iter().any(|h| h == DEV_HOSTS_SENTINEL))
    }
}

/// Decode the JSON stored in the `snippet_rules` column.
pub fn decode_rules(value: Option<serde_json::Value>) -> Result<Option<SnippetRule>, AppError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v)
            .map(Some)
            .map_err(|e| AppError::Validation(format!("Invalid snippet rules: {}", e))),
    }
}
