use tracing::{info, instrument, warn};

use crate::domain::{weekday_of, Actor, Appointment, BookingDraft, ServiceTotals};
use crate::error::{is_unique_violation, AppError, Result};
use crate::scheduling::availability::{ensure_within_schedule, validate_booking_window};
use crate::scheduling::conflict::find_conflict;
use crate::scheduling::lifecycle::authorize_booking;
use crate::scheduling::notify;
use crate::store::{appointments, directory, notifications, schedule, services};
use crate::AppState;

use super::local_now;

const IDEMPOTENCY_CONSTRAINT: &str = "appointments_idempotency_key_key";

#[derive(Debug)]
pub enum Created {
    New(Appointment),
    /// A booking with the same idempotency key already existed.
    Replayed(Appointment),
}

#[instrument(
    skip(state, draft),
    fields(provider_id = %draft.provider_id, date = %draft.date, start = %draft.start_time)
)]
pub async fn create_appointment(
    state: &AppState,
    actor: Actor,
    draft: &BookingDraft,
    idempotency_key: Option<&str>,
) -> Result<Created> {
    authorize_booking(actor, draft)?;

    if let Some(key) = idempotency_key {
        if let Some(existing) = appointments::find_by_idempotency_key(&state.db, key).await? {
            return replay(existing, draft);
        }
    }

    directory::get_provider(&state.db, draft.provider_id).await?;
    if let Some(client_id) = draft.client.registered_id() {
        directory::get_client(&state.db, client_id).await?;
    }

    let mut tx = state.db.begin().await?;

    let selected = services::select(&mut tx, draft.provider_id, &draft.service_ids).await?;
    let totals = ServiceTotals::from_services(&selected, state.config.scheduling.fallback_service_minutes)?;
    let window = validate_booking_window(draft.date, draft.start_time, totals.duration_minutes, local_now())?;

    // Providers may book walk-ins outside their published hours; clients may not.
    if let Actor::Client { .. } = actor {
        let working_hour = schedule::working_hour_for(&mut tx, draft.provider_id, weekday_of(draft.date)).await?;
        let blocked = schedule::blocked_days_on(&mut *tx, draft.provider_id, draft.date).await?;
        ensure_within_schedule(draft.date, &window, working_hour.as_ref(), &blocked)?;
    }

    appointments::set_lock_timeout(&mut tx, state.config.db_lock_timeout).await?;
    appointments::lock_day(&mut tx, draft.provider_id, draft.date).await?;

    let occupied = appointments::occupied_windows(&mut tx, draft.provider_id, draft.date).await?;
    if let Some(clash) = find_conflict(&window, &occupied, None) {
        warn!(conflicting = %clash.appointment_id, "slot taken");
        return Err(AppError::SlotUnavailable(format!(
            "{} on {} is no longer free",
            draft.start_time, draft.date
        )));
    }

    let new = appointments::NewAppointment {
        idempotency_key,
        provider_id: draft.provider_id,
        client: &draft.client,
        date: draft.date,
        start: draft.start_time,
        duration_minutes: totals.duration_minutes,
        total_value: totals.value,
        status: state.config.scheduling.initial_status(actor),
    };

    let inserted = appointments::insert(&mut tx, &new).await;
    let appointment = match inserted {
        Ok(appointment) => appointment,
        Err(err) if is_unique_violation(&err, IDEMPOTENCY_CONSTRAINT) => {
            drop(tx);
            let key = idempotency_key.unwrap_or_default();
            return match appointments::find_by_idempotency_key(&state.db, key).await? {
                Some(existing) => replay(existing, draft),
                None => Err(AppError::IdempotencyConflict {
                    idempotency_key: key.to_string(),
                }),
            };
        }
        Err(err) => return Err(err.into()),
    };

    appointments::replace_services(&mut tx, appointment.id, &draft.service_ids).await?;
    notifications::enqueue(&mut tx, &notify::on_created(&appointment)).await?;

    tx.commit().await?;

    info!(
        appointment_id = %appointment.id,
        status = appointment.status.as_str(),
        duration_minutes = appointment.duration_minutes,
        "appointment booked"
    );
    Ok(Created::New(appointment))
}

// A reused key must describe the same booking; anything else is a client bug.
fn replay(existing: Appointment, draft: &BookingDraft) -> Result<Created> {
    let same = existing.provider_id == draft.provider_id
        && existing.date == draft.date
        && existing.start_minute == i32::from(draft.start_time)
        && existing.client() == draft.client;
    if !same {
        return Err(AppError::IdempotencyConflict {
            idempotency_key: existing.idempotency_key.unwrap_or_default(),
        });
    }
    info!(appointment_id = %existing.id, "idempotent replay");
    Ok(Created::Replayed(existing))
}
