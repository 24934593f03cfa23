use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};
use crate::services::{
    headers_for_path, match_redirect, normalize_host, pick_weighted, request_path,
    select_snippets, HostingConfig, InjectedSnippets, MatchArgs, RedirectMatch,
};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LookupParams {
    /// Request `Host` header
    pub host: String,
    /// Request path, optionally with a query string
    #[param(default = "/")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LookupResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<LookupConfig>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LookupConfig {
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
    pub domain_name: Option<String>,
    pub has_custom_cert: bool,
    pub is_enterprise: bool,
    pub env_vars: BTreeMap<String, String>,
    /// Rewrite, redirect or proxy decision; absent when the path is served as is
    #[schema(value_type = Option<Object>)]
    pub redirect: Option<RedirectMatch>,
    #[schema(value_type = Object)]
    pub snippets: InjectedSnippets,
    /// Response headers for the requested path: the static file's own,
    /// overridden by matching environment header rules
    pub headers: Option<BTreeMap<String, String>>,
    pub error_file: Option<String>,
}

// ============ Handlers ============

/// Resolve the deployment serving a request
#[utoipa::path(
    get,
    path = "/hosting/lookup",
    params(LookupParams),
    responses(
        (status = 200, description = "Lookup result", body = LookupResponse),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Store unavailable")
    ),
    tag = "Hosting"
)]
pub async fn lookup(
    State(state): State<AppState>,
    Query(params): Query<LookupParams>,
) -> AppResult<Json<LookupResponse>> {
    let host = normalize_host(&params.host);
    if host.is_empty() {
        return Err(AppError::Validation("host is required".to_string()));
    }

    let path = match params.path.as_deref() {
        None | Some("") => "/".to_string(),
        Some(p) if p.starts_with('/') => p.to_string(),
        Some(p) => format!("/{}", p),
    };
    let url = Url::parse(&format!("https://{}{}", host, path))
        .map_err(|e| AppError::Validation(format!("Invalid request URL: {}", e)))?;

    let configs = resolve_cached(&state, &host).await?;

    let Some(config) = pick_weighted(&configs, fastrand::f64()) else {
        return Ok(Json(LookupResponse {
            found: false,
            config: None,
        }));
    };

    let redirect = match_redirect(MatchArgs {
        url: &url,
        host_name: &host,
        rules: &config.redirects,
        api_path_prefix: &config.api_path_prefix,
        api_location: config.api_location.as_deref(),
    });
    let path = request_path(&url);
    let snippets = select_snippets(&config.snippets, &path);

    Ok(Json(LookupResponse {
        found: true,
        config: Some(lookup_config(config, redirect, snippets, &path)),
    }))
}

async fn resolve_cached(state: &AppState, host: &str) -> AppResult<Arc<Vec<HostingConfig>>> {
    if let Some(configs) = state.cache.get(host) {
        return Ok(configs);
    }

    let generation = state.cache.generation();
    let configs = state.resolver.resolve_host(host).await?;
    Ok(state.cache.insert(host, configs, generation))
}

fn lookup_config(
    config: &HostingConfig,
    redirect: Option<RedirectMatch>,
    snippets: InjectedSnippets,
    path: &str,
) -> LookupConfig {
    LookupConfig {
        app_id: config.app_id,
        env_id: config.env_id,
        env_name: config.env_name.clone(),
        display_name: config.display_name.clone(),
        deployment_id: config.deployment_id,
        percentage: config.percentage,
        storage_location: config.storage_location.clone(),
        function_location: config.function_location.clone(),
        api_location: config.api_location.clone(),
        api_path_prefix: config.api_path_prefix.clone(),
        domain_name: config.domain_name.clone(),
        has_custom_cert: config.custom_cert.is_some(),
        is_enterprise: config.is_enterprise,
        env_vars: config.env_vars.clone(),
        redirect,
        snippets,
        headers: headers_for_path(config.static_files.get(path), &config.header_rules, path),
        error_file: config.error_file.clone(),
    }
}
