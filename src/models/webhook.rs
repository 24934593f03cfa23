use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Events an outbound webhook can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerWhen {
    OnDeploySuccess,
    OnDeployFailed,
    OnPublish,
    OnCachePurge,
}

impl TriggerWhen {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerWhen::OnDeploySuccess => "on_deploy_success",
            TriggerWhen::OnDeployFailed => "on_deploy_failed",
            TriggerWhen::OnPublish => "on_publish",
            TriggerWhen::OnCachePurge => "on_cache_purge",
        }
    }
}

impl std::str::FromStr for TriggerWhen {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on_deploy_success" => Ok(TriggerWhen::OnDeploySuccess),
            "on_deploy_failed" => Ok(TriggerWhen::OnDeployFailed),
            "on_publish" => Ok(TriggerWhen::OnPublish),
            "on_cache_purge" => Ok(TriggerWhen::OnCachePurge),
            other => Err(AppError::Validation(format!("Invalid webhook trigger: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Webhook {
    pub id: i64,
    pub app_id: i64,
    pub request_url: String,
    pub request_method: String,
    pub request_headers: BTreeMap<String, String>,
    pub request_payload: Option<String>,
    pub trigger_when: TriggerWhen,
}

/// Body delivered to webhooks subscribed to cache purges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePurgePayload {
    pub app_id: i64,
    pub environment_name: String,
}
