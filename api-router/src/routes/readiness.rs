use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::api_state::ApiState;

/// Readiness probe. Queries still work without the cache, so a degraded
/// cache is reported in the checks but does not fail the probe.
pub async fn ready(State(state): State<ApiState>) -> impl IntoResponse {
    let cache = if state.cache.is_degraded() {
        "degraded"
    } else {
        "ok"
    };

    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "checks": { "cache": cache }
        })),
    )
}
