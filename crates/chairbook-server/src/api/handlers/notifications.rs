use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::Notification;
use crate::error::Result;
use crate::store::notifications;
use crate::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    recipient_id: Uuid,
    #[serde(default)]
    unread_only: bool,
    #[serde(default = "default_limit")]
    limit: i64,
    offset: Option<i64>,
}

fn default_limit() -> i64 {
    50
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>> {
    let notifications = notifications::list(
        &state.db,
        query.recipient_id,
        query.unread_only,
        query.limit,
        query.offset.unwrap_or(0),
    )
    .await?;
    Ok(Json(notifications))
}

#[derive(Deserialize)]
pub struct MarkReadRequest {
    recipient_id: Uuid,
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<MarkReadRequest>,
) -> Result<Json<Notification>> {
    Ok(Json(
        notifications::mark_read(&state.db, id, req.recipient_id).await?,
    ))
}
