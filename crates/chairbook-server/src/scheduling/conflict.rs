//! Overlap detection between a candidate booking and the windows already
//! held on a provider's day.
//!
//! The same [`Window::overlaps`] predicate filters offered slots and gates
//! the final commit, so a slot that was offered can only be refused at
//! commit time because the calendar actually changed.

use uuid::Uuid;

use crate::domain::TimeOfDay;

/// Half-open minute range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: u32,
    pub end: u32,
}

impl Window {
    /// The end saturates, so an oversized duration still ends after `start`
    /// and never fits inside a shift.
    pub fn starting_at(start: TimeOfDay, duration_minutes: u32) -> Self {
        let start = start.minutes();
        Self {
            start,
            end: start.saturating_add(duration_minutes),
        }
    }

    pub fn overlaps(&self, other: &Window) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn fits_within(&self, outer: &Window) -> bool {
        self.start >= outer.start && self.end <= outer.end
    }
}

/// The window held by one non-cancelled appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccupiedWindow {
    pub appointment_id: Uuid,
    pub window: Window,
}

impl OccupiedWindow {
    pub fn new(appointment_id: Uuid, start: TimeOfDay, duration_minutes: u32) -> Self {
        Self {
            appointment_id,
            window: Window::starting_at(start, duration_minutes),
        }
    }
}

/// First occupied window the candidate collides with, ignoring `exclude`
/// (the appointment being moved during a reschedule).
pub fn find_conflict<'a>(
    candidate: &Window,
    occupied: &'a [OccupiedWindow],
    exclude: Option<Uuid>,
) -> Option<&'a OccupiedWindow> {
    occupied
        .iter()
        .filter(|o| Some(o.appointment_id) != exclude)
        .find(|o| candidate.overlaps(&o.window))
}

pub fn has_conflict(
    start: TimeOfDay,
    duration_minutes: u32,
    occupied: &[OccupiedWindow],
    exclude: Option<Uuid>,
) -> bool {
    find_conflict(&Window::starting_at(start, duration_minutes), occupied, exclude).is_some()
}
