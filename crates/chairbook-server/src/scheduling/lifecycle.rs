use serde::{Deserialize, Serialize};

use crate::domain::{Actor, Appointment, AppointmentStatus, BookingDraft, ClientRef};
use crate::scheduling::SchedulingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Confirm,
    Complete,
    CancelByClient,
    CancelByProvider,
}

impl LifecycleEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::Complete => "complete",
            Self::CancelByClient => "cancel (client)",
            Self::CancelByProvider => "cancel (provider)",
        }
    }

    /// The cancel event matching whoever asked for the cancellation.
    pub fn cancel_by(actor: Actor) -> Self {
        match actor {
            Actor::Client { .. } => Self::CancelByClient,
            Actor::Provider { .. } => Self::CancelByProvider,
        }
    }
}

pub fn next_status(
    current: AppointmentStatus,
    event: LifecycleEvent,
) -> Result<AppointmentStatus, SchedulingError> {
    use AppointmentStatus::*;

    let next = match (current, event) {
        (Pending, LifecycleEvent::Confirm) => Confirmed,
        (Pending | Confirmed, LifecycleEvent::Complete) => Completed,
        (Pending | Confirmed, LifecycleEvent::CancelByClient) => CancelledByClient,
        (Pending | Confirmed, LifecycleEvent::CancelByProvider) => CancelledByProvider,
        _ => return Err(SchedulingError::InvalidTransition { from: current, event }),
    };
    Ok(next)
}

pub fn ensure_reschedulable(current: AppointmentStatus) -> Result<(), SchedulingError> {
    if current.is_terminal() {
        return Err(SchedulingError::NotReschedulable(current));
    }
    Ok(())
}

/// Checks that `actor` may drive `event` on `appointment`.
pub fn authorize_transition(
    actor: Actor,
    appointment: &Appointment,
    event: LifecycleEvent,
) -> Result<(), SchedulingError> {
    match (event, actor) {
        (LifecycleEvent::CancelByClient, Actor::Client { id }) if appointment.client_id == Some(id) => Ok(()),
        (
            LifecycleEvent::Confirm | LifecycleEvent::Complete | LifecycleEvent::CancelByProvider,
            Actor::Provider { id },
        ) if appointment.provider_id == id => Ok(()),
        _ => Err(SchedulingError::Forbidden(format!(
            "actor may not {} this appointment",
            event.as_str()
        ))),
    }
}

/// Clients book only for themselves; providers book only on their own
/// calendar and are the only ones who may create guest bookings.
pub fn authorize_booking(actor: Actor, draft: &BookingDraft) -> Result<(), SchedulingError> {
    match (actor, &draft.client) {
        (Actor::Client { id }, ClientRef::Registered { id: client_id }) if id == *client_id => Ok(()),
        (Actor::Client { .. }, ClientRef::Guest { .. }) => Err(SchedulingError::Forbidden(
            "only providers can create guest bookings".into(),
        )),
        (Actor::Client { .. }, _) => Err(SchedulingError::Forbidden(
            "clients can only book for themselves".into(),
        )),
        (Actor::Provider { id }, _) if id == draft.provider_id => Ok(()),
        (Actor::Provider { .. }, _) => Err(SchedulingError::Forbidden(
            "providers can only book on their own calendar".into(),
        )),
    }
}

pub fn authorize_reschedule(actor: Actor, appointment: &Appointment) -> Result<(), SchedulingError> {
    let allowed = match actor {
        Actor::Client { id } => appointment.client_id == Some(id),
        Actor::Provider { id } => appointment.provider_id == id,
    };
    if !allowed {
        return Err(SchedulingError::Forbidden(
            "actor may not reschedule this appointment".into(),
        ));
    }
    Ok(())
}
