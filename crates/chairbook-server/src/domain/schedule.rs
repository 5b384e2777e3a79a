use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::time::{TimeError, TimeOfDay};

/// Day of week as stored: 0 = Sunday through 6 = Saturday.
pub fn weekday_of(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl Interval {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, ScheduleError> {
        if start >= end {
            return Err(ScheduleError::EmptyInterval { start, end });
        }
        Ok(Self { start, end })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkingHour {
    pub provider_id: Uuid,
    pub weekday: u8,
    pub active: bool,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    pub intervals: Vec<Interval>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BlockedDay {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("weekday must be between 0 (Sunday) and 6 (Saturday), got {0}")]
    InvalidWeekday(u8),

    #[error("interval {start}-{end} is empty or reversed")]
    EmptyInterval { start: TimeOfDay, end: TimeOfDay },

    #[error("working window {start}-{end} is empty or reversed")]
    EmptyWorkingWindow { start: TimeOfDay, end: TimeOfDay },

    #[error("stored schedule is corrupt: {0}")]
    Corrupt(#[from] TimeError),
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkingHourRow {
    pub provider_id: Uuid,
    pub weekday: i16,
    pub active: bool,
    pub start_minute: i32,
    pub end_minute: i32,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IntervalRow {
    pub weekday: i16,
    pub start_minute: i32,
    pub end_minute: i32,
}

impl WorkingHour {
    pub fn from_rows(row: WorkingHourRow, intervals: &[IntervalRow]) -> Result<Self, ScheduleError> {
        let intervals = intervals
            .iter()
            .filter(|i| i.weekday == row.weekday)
            .map(|i| {
                Ok(Interval {
                    start: TimeOfDay::try_from(i.start_minute)?,
                    end: TimeOfDay::try_from(i.end_minute)?,
                })
            })
            .collect::<Result<Vec<_>, ScheduleError>>()?;

        Ok(Self {
            provider_id: row.provider_id,
            weekday: row.weekday as u8,
            active: row.active,
            start_time: TimeOfDay::try_from(row.start_minute)?,
            end_time: TimeOfDay::try_from(row.end_minute)?,
            intervals,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpsertWorkingHourRequest {
    pub active: bool,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
    #[serde(default)]
    pub intervals: Vec<IntervalRequest>,
}

#[derive(Debug, Deserialize)]
pub struct IntervalRequest {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl UpsertWorkingHourRequest {
    pub fn into_working_hour(self, provider_id: Uuid, weekday: u8) -> Result<WorkingHour, ScheduleError> {
        if weekday > 6 {
            return Err(ScheduleError::InvalidWeekday(weekday));
        }
        if self.start_time >= self.end_time {
            return Err(ScheduleError::EmptyWorkingWindow {
                start: self.start_time,
                end: self.end_time,
            });
        }

        let mut intervals = self
            .intervals
            .into_iter()
            .map(|i| Interval::new(i.start, i.end))
            .collect::<Result<Vec<_>, _>>()?;
        intervals.sort_by_key(|i| i.start);

        Ok(WorkingHour {
            provider_id,
            weekday,
            active: self.active,
            start_time: self.start_time,
            end_time: self.end_time,
            intervals,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateBlockedDayRequest {
    pub date: NaiveDate,
    pub reason: Option<String>,
}
