use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CacheResetRequest {
    /// Environment whose keys are derived when no explicit keys are given
    pub env_id: Option<i64>,
    /// Hosts or `^`-prefixed host patterns
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Invalidate hosting cache entries
#[utoipa::path(
    post,
    path = "/api/cache/reset",
    request_body = CacheResetRequest,
    responses(
        (status = 204, description = "Invalidation broadcast"),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Store unavailable")
    ),
    tag = "Cache"
)]
pub async fn reset_cache(
    State(state): State<AppState>,
    Json(input): Json<CacheResetRequest>,
) -> AppResult<StatusCode> {
    let env_id = input.env_id.unwrap_or(0);

    if env_id < 0 {
        return Err(AppError::Validation("envId must be positive".to_string()));
    }
    if env_id == 0 && input.keys.iter().all(|k| k.trim().is_empty()) {
        return Err(AppError::Validation(
            "envId or keys is required".to_string(),
        ));
    }

    let keys: Vec<String> = input
        .keys
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect();

    state.invalidator.reset(env_id, &keys).await?;

    Ok(StatusCode::NO_CONTENT)
}
