use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::booking::local_now;
use crate::domain::time::MINUTES_PER_DAY;
use crate::domain::{weekday_of, ServiceTotals, TimeOfDay};
use crate::error::{AppError, Result};
use crate::scheduling::availability::{compute_slots, AvailabilityInput};
use crate::store::{appointments, directory, schedule, services};
use crate::AppState;

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    date: NaiveDate,
    duration: Option<u32>,
    /// Comma separated service ids; their summed duration is used when
    /// `duration` is absent.
    service_ids: Option<String>,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    provider_id: Uuid,
    date: NaiveDate,
    duration_minutes: u32,
    slots: Vec<TimeOfDay>,
}

fn parse_ids(raw: &str) -> Result<Vec<Uuid>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse()
                .map_err(|_| AppError::Validation(format!("invalid service id: {s}")))
        })
        .collect()
}

pub async fn slots(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<Uuid>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>> {
    directory::get_provider(&state.db, provider_id).await?;

    let mut conn = state.db.acquire().await?;

    let duration_minutes = match (query.duration, query.service_ids.as_deref()) {
        (Some(minutes), _) => {
            if minutes == 0 || minutes > MINUTES_PER_DAY {
                return Err(AppError::Validation(format!(
                    "duration must be between 1 and {MINUTES_PER_DAY}"
                )));
            }
            minutes
        }
        (None, Some(raw)) => {
            let ids = parse_ids(raw)?;
            let selected = services::select(&mut conn, provider_id, &ids).await?;
            ServiceTotals::from_services(&selected, state.config.scheduling.fallback_service_minutes)?
                .duration_minutes
        }
        (None, None) => {
            return Err(AppError::Validation(
                "either duration or service_ids is required".into(),
            ))
        }
    };

    let working_hour = schedule::working_hour_for(&mut conn, provider_id, weekday_of(query.date)).await?;
    let blocked_days = schedule::blocked_days_on(&mut *conn, provider_id, query.date).await?;
    let occupied = appointments::occupied_windows(&mut conn, provider_id, query.date).await?;

    let slots = compute_slots(
        &state.config.scheduling,
        &AvailabilityInput {
            date: query.date,
            duration_minutes,
            working_hour: working_hour.as_ref(),
            blocked_days: &blocked_days,
            occupied: &occupied,
            now: local_now(),
        },
    )?;

    Ok(Json(AvailabilityResponse {
        provider_id,
        date: query.date,
        duration_minutes,
        slots,
    }))
}
