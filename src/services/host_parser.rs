//! Hostname → hosting identity.
//!
//! Dev hosts follow the grammar `<display>[--<env-or-deployment-id>].<dev-domain>`;
//! anything else is an opaque custom domain.

use serde::Serialize;

const SEPARATOR: &str = "--";

/// What a dev subdomain points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DevTarget {
    /// No explicit target: the app's default environment
    Default,
    Environment(String),
    Deployment(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostIdentity {
    CustomDomain {
        domain_name: String,
    },
    DevDomain {
        display_name: String,
        target: DevTarget,
    },
    /// A dev host that can never resolve (e.g. a deployment id beyond 32 bits).
    /// Callers answer "no match" without querying the store.
    Unroutable,
}

impl HostIdentity {
    pub fn is_dev_domain(&self) -> bool {
        matches!(self, HostIdentity::DevDomain { .. })
    }

    pub fn display_name(&self) -> Option<&str> {
        match self {
            HostIdentity::DevDomain { display_name, .. } => Some(display_name),
            _ => None,
        }
    }

    pub fn env_name(&self) -> Option<&str> {
        match self {
            HostIdentity::DevDomain {
                target: DevTarget::Environment(name),
                ..
            } => Some(name),
            _ => None,
        }
    }

    pub fn deployment_id(&self) -> Option<i64> {
        match self {
            HostIdentity::DevDomain {
                target: DevTarget::Deployment(id),
                ..
            } => Some(*id),
            _ => None,
        }
    }

    /// Rebuild the hostname this identity was parsed from.
    pub fn to_host(&self, dev_domain: &str) -> Option<String> {
        match self {
            HostIdentity::CustomDomain { domain_name } => Some(domain_name.clone()),
            HostIdentity::DevDomain {
                display_name,
                target,
            } => Some(match target {
                DevTarget::Default => format!("{}.{}", display_name, dev_domain),
                DevTarget::Environment(env) => {
                    format!("{}{}{}.{}", display_name, SEPARATOR, env, dev_domain)
                }
                DevTarget::Deployment(id) => {
                    format!("{}{}{}.{}", display_name, SEPARATOR, id, dev_domain)
                }
            }),
            HostIdentity::Unroutable => None,
        }
    }
}

/// Lower-case the host and drop any `:port` suffix.
pub fn normalize_host(raw: &str) -> String {
    let host = raw.trim();

    // Bracketed IPv6 literals keep their colons
    let host = if host.starts_with('[') {
        host.split_once(']')
            .map(|(h, _)| &host[..h.len() + 1])
            .unwrap_or(host)
    } else {
        host.split(':').next().unwrap_or(host)
    };

    host.trim_end_matches('.').to_ascii_lowercase()
}

/// Parse a `Host` header value against the configured dev domain suffix.
pub fn parse_host(raw_host: &str, dev_domain: &str) -> HostIdentity {
    let host = normalize_host(raw_host);
    let suffix = format!(".{}", dev_domain.to_ascii_lowercase());

    let Some(token) = host.strip_suffix(&suffix) else {
        return HostIdentity::CustomDomain { domain_name: host };
    };

    if token.is_empty() {
        return HostIdentity::Unroutable;
    }

    let Some((display_name, rest)) = token.split_once(SEPARATOR) else {
        return HostIdentity::DevDomain {
            display_name: token.to_string(),
            target: DevTarget::Default,
        };
    };

    if display_name.is_empty() || rest.is_empty() {
        return HostIdentity::Unroutable;
    }

    // A leading zero never appears in a deployment id, so `007` names an environment
    let is_deployment_id = rest.bytes().all(|b| b.is_ascii_digit()) && !rest.starts_with('0');

    let target = if is_deployment_id {
        match rest.parse::<i64>() {
            Ok(id) if id <= i64::from(i32::MAX) => DevTarget::Deployment(id),
            _ => return HostIdentity::Unroutable,
        }
    } else {
        DevTarget::Environment(rest.to_string())
    };

    HostIdentity::DevDomain {
        display_name: display_name.to_string(),
        target,
    }
}
