use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,
    pub redis_url: String,

    // Hosting
    pub dev_domain: String,
    pub default_env_name: String,
    pub api_path_prefix: String,
    pub self_hosted: bool,
    pub license_edition: Option<String>,
    pub cache_ttl_secs: u64,
    pub cache_capacity: usize,
    pub webhook_timeout_secs: u64,

    // Server
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if exists

        Ok(Self {
            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            redis_url: env::var("REDIS_URL").map_err(|_| ConfigError::Missing("REDIS_URL"))?,

            // Hosting
            dev_domain: normalize_dev_domain(
                &env::var("DEV_DOMAIN").unwrap_or_else(|_| "hostplane.dev".to_string()),
            )
            .ok_or(ConfigError::Invalid("DEV_DOMAIN"))?,
            default_env_name: env::var("DEFAULT_ENV_NAME")
                .unwrap_or_else(|_| "production".to_string()),
            api_path_prefix: env::var("API_PATH_PREFIX").unwrap_or_else(|_| "/api".to_string()),
            self_hosted: parse_bool(env::var("SELF_HOSTED").ok().as_deref())
                .ok_or(ConfigError::Invalid("SELF_HOSTED"))?,
            license_edition: env::var("LICENSE_EDITION")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            cache_ttl_secs: env::var("HOSTING_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("HOSTING_CACHE_TTL_SECS"))?,
            cache_capacity: env::var("HOSTING_CACHE_CAPACITY")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("HOSTING_CACHE_CAPACITY"))?,
            webhook_timeout_secs: env::var("WEBHOOK_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("WEBHOOK_TIMEOUT_SECS"))?,

            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT"))?,
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        })
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Enterprise features are granted by the license when self-hosted,
    /// otherwise by the billing tier of the resource owner.
    pub fn is_enterprise(&self, owner_tier: Option<&str>) -> bool {
        if self.self_hosted {
            return self
                .license_edition
                .as_deref()
                .is_some_and(|e| e.eq_ignore_ascii_case("enterprise"));
        }

        owner_tier.is_some_and(|t| t.eq_ignore_ascii_case("enterprise"))
    }
}

/// Reduce a configured dev endpoint to the bare hostname used as suffix.
/// Accepts either `example.dev` or a URL like `https://example.dev:8888`.
pub fn normalize_dev_domain(raw: &str) -> Option<String> {
    let raw = raw.trim();

    if raw.contains("://") {
        let parsed = url::Url::parse(raw).ok()?;
        return parsed.host_str().map(|h| h.to_ascii_lowercase());
    }

    let host = raw.split(':').next()?.trim_end_matches('/');
    if host.is_empty() {
        return None;
    }

    Some(host.to_ascii_lowercase())
}

fn parse_bool(value: Option<&str>) -> Option<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        None => Some(false),
        Some(v) if v.is_empty() || v == "false" || v == "0" || v == "no" => Some(false),
        Some(v) if v == "true" || v == "1" || v == "yes" => Some(true),
        Some(_) => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid environment variable: {0}")]
    Invalid(&'static str),
}
