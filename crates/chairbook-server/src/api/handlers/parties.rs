use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use uuid::Uuid;

use crate::domain::{Client, CreatePartyRequest, Provider};
use crate::error::{AppError, Result};
use crate::store::directory;
use crate::AppState;

fn validated_name(req: &CreatePartyRequest) -> Result<&str> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    Ok(name)
}

pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePartyRequest>,
) -> Result<impl IntoResponse> {
    let provider = directory::insert_provider(&state.db, validated_name(&req)?).await?;
    Ok((StatusCode::CREATED, Json(provider)))
}

pub async fn get_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Provider>> {
    Ok(Json(directory::get_provider(&state.db, id).await?))
}

pub async fn create_client(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreatePartyRequest>,
) -> Result<impl IntoResponse> {
    let client = directory::insert_client(&state.db, validated_name(&req)?).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>> {
    Ok(Json(directory::get_client(&state.db, id).await?))
}
