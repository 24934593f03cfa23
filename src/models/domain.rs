use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: i64,
    pub app_id: i64,
    pub env_id: i64,
    pub name: String,
    pub verified: bool,
    pub verified_at: Option<OffsetDateTime>,
    pub custom_cert: Option<CustomCert>,
    pub last_ping: Option<PingResult>,
}

/// User-provided TLS certificate attached to a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCert {
    pub value: String,
    pub key: String,
}

impl CustomCert {
    /// Both halves must be present for the certificate to be usable
    pub fn from_parts(value: Option<String>, key: Option<String>) -> Option<Self> {
        match (value, key) {
            (Some(value), Some(key)) if !value.is_empty() && !key.is_empty() => {
                Some(Self { value, key })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResult {
    pub status: u16,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub last_ping_at: Option<OffsetDateTime>,
}

/// Domains unverified as a consequence of an environment soft delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedDomains {
    pub env_id: i64,
    pub app_id: i64,
    pub domain_names: Vec<String>,
}
