use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Actor, Appointment};
use crate::error::Result;
use crate::scheduling::lifecycle::{authorize_transition, next_status, LifecycleEvent};
use crate::scheduling::notify;
use crate::store::{appointments, notifications};
use crate::AppState;

/// Applies a lifecycle event under a row lock on the appointment.
#[instrument(skip(state), fields(event = event.as_str()))]
pub async fn transition_appointment(
    state: &AppState,
    id: Uuid,
    actor: Actor,
    event: LifecycleEvent,
) -> Result<Appointment> {
    let mut tx = state.db.begin().await?;
    appointments::set_lock_timeout(&mut tx, state.config.db_lock_timeout).await?;

    let current = appointments::find_for_update(&mut tx, id).await?;
    authorize_transition(actor, &current, event)?;
    let status = next_status(current.status, event)?;

    let updated = appointments::update_status(&mut tx, id, status).await?;
    notifications::enqueue(&mut tx, &notify::on_transition(&updated, event)).await?;

    tx.commit().await?;

    info!(
        appointment_id = %id,
        from = current.status.as_str(),
        to = updated.status.as_str(),
        "appointment transitioned"
    );
    Ok(updated)
}
