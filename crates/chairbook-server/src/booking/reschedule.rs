use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{weekday_of, Actor, Appointment, AppointmentStatus, RescheduleRequest, ServiceTotals};
use crate::error::{AppError, Result};
use crate::scheduling::availability::{ensure_within_schedule, validate_booking_window};
use crate::scheduling::conflict::find_conflict;
use crate::scheduling::lifecycle::{authorize_reschedule, ensure_reschedulable};
use crate::scheduling::notify;
use crate::store::{appointments, directory, notifications, schedule, services};
use crate::AppState;

use super::local_now;

/// Moves an open appointment to a new provider, date, time and service set.
/// The moved appointment never conflicts with its own previous window, and
/// comes out confirmed whatever state it was in.
#[instrument(skip(state, req), fields(date = %req.date, start = %req.start_time))]
pub async fn reschedule_appointment(
    state: &AppState,
    id: Uuid,
    req: &RescheduleRequest,
) -> Result<Appointment> {
    let mut tx = state.db.begin().await?;
    appointments::set_lock_timeout(&mut tx, state.config.db_lock_timeout).await?;

    let current = appointments::find_for_update(&mut tx, id).await?;
    authorize_reschedule(req.actor, &current)?;
    ensure_reschedulable(current.status)?;

    let provider_id = req.provider_id.unwrap_or(current.provider_id);
    if provider_id != current.provider_id {
        directory::get_provider(&mut *tx, provider_id).await?;
    }

    let selected = services::select(&mut tx, provider_id, &req.service_ids).await?;
    let totals = ServiceTotals::from_services(&selected, state.config.scheduling.fallback_service_minutes)?;
    let window = validate_booking_window(req.date, req.start_time, totals.duration_minutes, local_now())?;

    if let Actor::Client { .. } = req.actor {
        let working_hour = schedule::working_hour_for(&mut tx, provider_id, weekday_of(req.date)).await?;
        let blocked = schedule::blocked_days_on(&mut *tx, provider_id, req.date).await?;
        ensure_within_schedule(req.date, &window, working_hour.as_ref(), &blocked)?;
    }

    appointments::lock_day(&mut tx, provider_id, req.date).await?;

    let occupied = appointments::occupied_windows(&mut tx, provider_id, req.date).await?;
    if let Some(clash) = find_conflict(&window, &occupied, Some(id)) {
        warn!(conflicting = %clash.appointment_id, "target slot taken");
        return Err(AppError::SlotUnavailable(format!(
            "{} on {} is no longer free",
            req.start_time, req.date
        )));
    }

    let updated = appointments::update_schedule(
        &mut tx,
        id,
        provider_id,
        req.date,
        req.start_time,
        totals.duration_minutes,
        totals.value,
        AppointmentStatus::Confirmed,
    )
    .await?;
    appointments::replace_services(&mut tx, id, &req.service_ids).await?;
    notifications::enqueue(&mut tx, &notify::on_rescheduled(&updated, req.actor)).await?;

    tx.commit().await?;

    info!(
        appointment_id = %id,
        from_date = %current.date,
        to_date = %updated.date,
        "appointment rescheduled"
    );
    Ok(updated)
}
