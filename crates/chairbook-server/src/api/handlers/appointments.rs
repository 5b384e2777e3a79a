use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::booking::{self, Created};
use crate::domain::{
    Appointment, AppointmentResponse, AppointmentStatus, ClientRef, CreateAppointmentRequest,
    RescheduleRequest, TransitionRequest,
};
use crate::error::{AppError, Result};
use crate::scheduling::lifecycle::LifecycleEvent;
use crate::store::appointments::{self, AppointmentFilter};
use crate::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    provider_id: Option<Uuid>,
    client_id: Option<Uuid>,
    date: Option<NaiveDate>,
    status: Option<AppointmentStatus>,
    #[serde(default = "default_limit")]
    limit: i64,
    offset: Option<i64>,
}

fn default_limit() -> i64 {
    50
}

async fn respond(state: &AppState, appointment: Appointment) -> Result<AppointmentResponse> {
    let service_ids = appointments::service_ids(&state.db, appointment.id).await?;
    Ok(AppointmentResponse::new(appointment, service_ids))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<AppointmentResponse>>> {
    let filter = AppointmentFilter {
        provider_id: query.provider_id,
        client_id: query.client_id,
        date: query.date,
        status: query.status,
        limit: query.limit,
        offset: query.offset.unwrap_or(0),
    };

    let listed = appointments::list(&state.db, &filter).await?;
    let ids: Vec<Uuid> = listed.iter().map(|a| a.id).collect();
    let mut linked = appointments::service_ids_for(&state.db, &ids).await?;

    let responses = listed
        .into_iter()
        .map(|appointment| {
            let service_ids = linked.remove(&appointment.id).unwrap_or_default();
            AppointmentResponse::new(appointment, service_ids)
        })
        .collect();
    Ok(Json(responses))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<impl IntoResponse> {
    let idempotency_key = headers
        .get("idempotency-key")
        .and_then(|h| h.to_str().ok())
        .map(String::from);

    if let ClientRef::Guest { name } = &req.draft.client {
        if name.trim().is_empty() {
            return Err(AppError::Validation("guest name must not be empty".into()));
        }
    }

    let created =
        booking::create_appointment(&state, req.actor, &req.draft, idempotency_key.as_deref()).await?;

    let (status, appointment) = match created {
        Created::New(appointment) => (StatusCode::CREATED, appointment),
        Created::Replayed(appointment) => (StatusCode::OK, appointment),
    };
    Ok((status, Json(respond(&state, appointment).await?)))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>> {
    let appointment = appointments::find(&state.db, id).await?;
    Ok(Json(respond(&state, appointment).await?))
}

async fn transition(
    state: &AppState,
    id: Uuid,
    req: TransitionRequest,
    event: LifecycleEvent,
) -> Result<Json<AppointmentResponse>> {
    let appointment = booking::transition_appointment(state, id, req.actor, event).await?;
    Ok(Json(respond(state, appointment).await?))
}

pub async fn confirm(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<AppointmentResponse>> {
    transition(&state, id, req, LifecycleEvent::Confirm).await
}

pub async fn complete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<AppointmentResponse>> {
    transition(&state, id, req, LifecycleEvent::Complete).await
}

/// Cancels on behalf of whoever the actor is; the resulting status records
/// which side cancelled.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionRequest>,
) -> Result<Json<AppointmentResponse>> {
    let event = LifecycleEvent::cancel_by(req.actor);
    transition(&state, id, req, event).await
}

pub async fn reschedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<RescheduleRequest>,
) -> Result<Json<AppointmentResponse>> {
    let appointment = booking::reschedule_appointment(&state, id, &req).await?;
    Ok(Json(respond(&state, appointment).await?))
}
