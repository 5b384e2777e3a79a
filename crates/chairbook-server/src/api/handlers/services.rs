use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::time::MINUTES_PER_DAY;
use crate::domain::{CreateServiceRequest, Service};
use crate::error::{AppError, Result};
use crate::store::{directory, services};
use crate::AppState;

pub async fn create(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<Uuid>,
    Json(req): Json<CreateServiceRequest>,
) -> Result<impl IntoResponse> {
    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    if req.duration_minutes == 0 || req.duration_minutes > MINUTES_PER_DAY {
        return Err(AppError::Validation(format!(
            "duration_minutes must be between 1 and {MINUTES_PER_DAY}"
        )));
    }
    if req.price < Decimal::ZERO {
        return Err(AppError::Validation("price must not be negative".into()));
    }

    directory::get_provider(&state.db, provider_id).await?;
    let service = services::insert(&state.db, provider_id, &req).await?;

    Ok((StatusCode::CREATED, Json(service)))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Vec<Service>>> {
    directory::get_provider(&state.db, provider_id).await?;
    Ok(Json(services::list_for_provider(&state.db, provider_id).await?))
}
