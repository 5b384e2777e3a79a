//! Bookable start times for one provider on one date.
//!
//! Candidates come from a fixed grid anchored at the working hour's start
//! (30 minutes by default). A candidate survives if its whole window fits
//! inside one declared interval, it collides with no occupied window, and,
//! for today, it does not start before the current minute.

use chrono::{NaiveDate, NaiveDateTime, Timelike};

use crate::domain::time::MINUTES_PER_DAY;
use crate::domain::{weekday_of, BlockedDay, TimeOfDay, WorkingHour};
use crate::scheduling::conflict::{find_conflict, OccupiedWindow, Window};
use crate::scheduling::{SchedulingError, SchedulingPolicy};

#[derive(Debug, Clone, Copy)]
pub struct AvailabilityInput<'a> {
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub working_hour: Option<&'a WorkingHour>,
    pub blocked_days: &'a [BlockedDay],
    pub occupied: &'a [OccupiedWindow],
    pub now: NaiveDateTime,
}

/// Ascending list of start times that can be offered for `input.date`.
///
/// Absent configuration, blocked dates, inactive weekdays and past dates all
/// produce an empty list rather than an error.
pub fn compute_slots(
    policy: &SchedulingPolicy,
    input: &AvailabilityInput<'_>,
) -> Result<Vec<TimeOfDay>, SchedulingError> {
    if input.duration_minutes == 0 {
        return Err(SchedulingError::NonPositiveDuration);
    }
    if policy.slot_step_minutes == 0 {
        return Err(SchedulingError::InvalidSlotStep);
    }

    // Nothing longer than a day fits in any shift.
    if input.duration_minutes > MINUTES_PER_DAY {
        return Ok(Vec::new());
    }
    if input.blocked_days.iter().any(|b| b.date == input.date) {
        return Ok(Vec::new());
    }

    let working_hour = match input.working_hour {
        Some(wh) if wh.active && wh.weekday == weekday_of(input.date) => wh,
        _ => return Ok(Vec::new()),
    };

    let today = input.now.date();
    if input.date < today {
        return Ok(Vec::new());
    }
    let earliest = if input.date == today {
        input.now.hour() * 60 + input.now.minute()
    } else {
        0
    };

    let shifts: Vec<Window> = working_hour
        .intervals
        .iter()
        .map(|i| Window {
            start: i.start.minutes(),
            end: i.end.minutes(),
        })
        .collect();

    let end = working_hour.end_time.minutes();
    let mut slots = Vec::new();
    let mut minute = working_hour.start_time.minutes();
    while minute < end {
        let Some(candidate_end) = minute.checked_add(input.duration_minutes) else {
            break;
        };
        let candidate = Window {
            start: minute,
            end: candidate_end,
        };

        if minute >= earliest
            && shifts.iter().any(|shift| candidate.fits_within(shift))
            && find_conflict(&candidate, input.occupied, None).is_none()
        {
            slots.push(TimeOfDay::from_minutes(minute)?);
        }

        minute = match minute.checked_add(policy.slot_step_minutes) {
            Some(next) => next,
            None => break,
        };
    }

    Ok(slots)
}

/// Validates a window about to be committed: positive duration, ends by
/// midnight, and does not start before the current minute.
pub fn validate_booking_window(
    date: NaiveDate,
    start: TimeOfDay,
    duration_minutes: u32,
    now: NaiveDateTime,
) -> Result<Window, SchedulingError> {
    if duration_minutes == 0 {
        return Err(SchedulingError::NonPositiveDuration);
    }
    let window = Window::starting_at(start, duration_minutes);
    if window.end > MINUTES_PER_DAY {
        return Err(SchedulingError::PastMidnight {
            start,
            duration_minutes,
        });
    }
    let today = now.date();
    if date < today || (date == today && start.minutes() < now.hour() * 60 + now.minute()) {
        return Err(SchedulingError::InPast);
    }
    Ok(window)
}

/// Checks that a committed window lies on an open day and inside one of the
/// declared intervals, the same rules that govern which slots are offered.
pub fn ensure_within_schedule(
    date: NaiveDate,
    window: &Window,
    working_hour: Option<&WorkingHour>,
    blocked_days: &[BlockedDay],
) -> Result<(), SchedulingError> {
    if blocked_days.iter().any(|b| b.date == date) {
        return Err(SchedulingError::DayBlocked(date));
    }
    let inside = working_hour
        .filter(|wh| wh.active && wh.weekday == weekday_of(date))
        .is_some_and(|wh| {
            wh.intervals.iter().any(|i| {
                window.fits_within(&Window {
                    start: i.start.minutes(),
                    end: i.end.minutes(),
                })
            })
        });
    if !inside {
        return Err(SchedulingError::OutsideWorkingHours {
            date,
            start: TimeOfDay::from_minutes(window.start)?,
        });
    }
    Ok(())
}
