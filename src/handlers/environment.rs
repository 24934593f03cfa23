use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::models::AffectedDomains;
use crate::services::dev_host_pattern;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEnvironmentResponse {
    pub env_id: i64,
    pub app_id: i64,
    /// Domains that were unverified with the environment
    pub domain_names: Vec<String>,
}

impl From<AffectedDomains> for DeleteEnvironmentResponse {
    fn from(a: AffectedDomains) -> Self {
        Self {
            env_id: a.env_id,
            app_id: a.app_id,
            domain_names: a.domain_names,
        }
    }
}

/// Soft delete an environment
#[utoipa::path(
    delete,
    path = "/api/environments/{id}",
    params(
        ("id" = i64, Path, description = "Environment ID")
    ),
    responses(
        (status = 200, description = "Environment deleted", body = DeleteEnvironmentResponse),
        (status = 400, description = "Default environment cannot be deleted"),
        (status = 404, description = "Environment not found")
    ),
    tag = "Environments"
)]
pub async fn delete_environment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DeleteEnvironmentResponse>> {
    let env = state
        .stores
        .environments
        .find_environment(id)
        .await?
        .filter(|e| !e.is_deleted())
        .ok_or_else(|| AppError::NotFound("Environment".to_string()))?;

    if env.name == state.config.default_env_name {
        return Err(AppError::Validation(format!(
            "The {} environment cannot be deleted",
            env.name
        )));
    }

    // Looked up first: the derived keys are gone once the domains are unverified
    let display_names = state.stores.environments.display_names(id).await?;
    let affected = state.stores.environments.delete_environment(id).await?;

    let mut keys = affected.domain_names.clone();
    keys.extend(display_names.iter().map(|name| dev_host_pattern(name)));
    state.invalidator.reset(id, &keys).await?;

    Ok(Json(affected.into()))
}
