//! Transactional booking workflows.
//!
//! Each workflow takes the per-(provider, date) advisory lock before it
//! reads the occupied windows it checks against, so two writers aiming at
//! the same day are serialized and the later one sees the earlier one's row.
//! The exclusion constraint on `appointments` backs this up.

mod create;
mod reschedule;
mod transition;

pub use create::{create_appointment, Created};
pub use reschedule::reschedule_appointment;
pub use transition::transition_appointment;

use chrono::{Local, NaiveDateTime};

/// Wall-clock time in the server's zone. Dates and times of day are stored
/// without a zone and read as local.
pub(crate) fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
