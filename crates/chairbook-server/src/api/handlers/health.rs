use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    slot_step_minutes: Option<u32>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        slot_step_minutes: None,
    })
}

/// Ready once the database answers and the overlap constraint's extension
/// is installed.
pub async fn ready(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, StatusCode> {
    let installed: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM pg_extension WHERE extname = 'btree_gist')")
            .fetch_one(&state.db)
            .await
            .map_err(|e| {
                warn!(error = %e, "readiness probe failed");
                StatusCode::SERVICE_UNAVAILABLE
            })?;

    if !installed {
        warn!("btree_gist extension missing");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(HealthResponse {
        status: "ready",
        slot_step_minutes: Some(state.config.scheduling.slot_step_minutes),
    }))
}
