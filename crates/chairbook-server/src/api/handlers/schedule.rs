use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::domain::{BlockedDay, CreateBlockedDayRequest, UpsertWorkingHourRequest, WorkingHour};
use crate::error::{AppError, Result};
use crate::store::{directory, schedule};
use crate::AppState;

pub async fn list_working_hours(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Vec<WorkingHour>>> {
    directory::get_provider(&state.db, provider_id).await?;
    Ok(Json(schedule::list_working_hours(&state.db, provider_id).await?))
}

pub async fn upsert_working_hour(
    State(state): State<Arc<AppState>>,
    Path((provider_id, weekday)): Path<(Uuid, u8)>,
    Json(req): Json<UpsertWorkingHourRequest>,
) -> Result<Json<WorkingHour>> {
    let working_hour = req.into_working_hour(provider_id, weekday)?;
    directory::get_provider(&state.db, provider_id).await?;

    let mut tx = state.db.begin().await?;
    schedule::upsert_working_hour(&mut tx, &working_hour).await?;
    tx.commit().await?;

    info!(
        provider_id = %provider_id,
        weekday,
        active = working_hour.active,
        intervals = working_hour.intervals.len(),
        "working hour updated"
    );
    Ok(Json(working_hour))
}

#[derive(Deserialize)]
pub struct BlockedDaysQuery {
    from: Option<NaiveDate>,
}

pub async fn list_blocked_days(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<BlockedDaysQuery>,
) -> Result<Json<Vec<BlockedDay>>> {
    directory::get_provider(&state.db, provider_id).await?;
    Ok(Json(
        schedule::list_blocked_days(&state.db, provider_id, query.from).await?,
    ))
}

pub async fn create_blocked_day(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<Uuid>,
    Json(req): Json<CreateBlockedDayRequest>,
) -> Result<impl IntoResponse> {
    directory::get_provider(&state.db, provider_id).await?;
    let day =
        schedule::insert_blocked_day(&state.db, provider_id, req.date, req.reason.as_deref()).await?;

    info!(provider_id = %provider_id, date = %day.date, "day blocked");
    Ok((StatusCode::CREATED, Json(day)))
}

pub async fn delete_blocked_day(
    State(state): State<Arc<AppState>>,
    Path((provider_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<StatusCode> {
    if !schedule::delete_blocked_day(&state.db, provider_id, date).await? {
        return Err(AppError::NotFound(format!("blocked day {date}")));
    }
    info!(provider_id = %provider_id, date = %date, "day unblocked");
    Ok(StatusCode::NO_CONTENT)
}
