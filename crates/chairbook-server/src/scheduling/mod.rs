pub mod availability;
pub mod conflict;
pub mod earnings;
pub mod lifecycle;
pub mod notify;
mod policy;

pub use policy::SchedulingPolicy;

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{AppointmentStatus, ServiceSelectionError, TimeError, TimeOfDay};
use lifecycle::LifecycleEvent;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("duration must be positive")]
    NonPositiveDuration,

    #[error("slot step must be positive")]
    InvalidSlotStep,

    #[error("a {duration_minutes} minute window starting at {start} runs past midnight")]
    PastMidnight { start: TimeOfDay, duration_minutes: u32 },

    #[error("cannot book a window that has already started")]
    InPast,

    #[error("{start} on {date} is outside the provider's working hours")]
    OutsideWorkingHours { date: NaiveDate, start: TimeOfDay },

    #[error("{0} is blocked in the provider's calendar")]
    DayBlocked(NaiveDate),

    #[error("cannot {} an appointment that is {}", event.as_str(), from.as_str())]
    InvalidTransition {
        from: AppointmentStatus,
        event: LifecycleEvent,
    },

    #[error("cannot reschedule an appointment that is {}", .0.as_str())]
    NotReschedulable(AppointmentStatus),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Services(#[from] ServiceSelectionError),

    #[error(transparent)]
    Time(#[from] TimeError),
}
