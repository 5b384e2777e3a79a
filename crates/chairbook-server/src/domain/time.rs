//! Wall-clock time-of-day arithmetic.
//!
//! All values are local minutes since midnight. There is no timezone handling:
//! the service runs in a single implicit local timezone.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("malformed time of day {0:?}, expected HH:mm")]
    Malformed(String),

    #[error("hour out of range: {0}")]
    HourOutOfRange(u32),

    #[error("minute out of range: {0}")]
    MinuteOutOfRange(u32),

    #[error("minute offset out of range: {0}")]
    OffsetOutOfRange(i64),
}

/// Parses `HH:mm` (one or two hour digits, exactly two minute digits) into
/// minutes since midnight.
pub fn to_minutes(value: &str) -> Result<u32, TimeError> {
    let malformed = || TimeError::Malformed(value.to_string());

    let (hours, minutes) = value.split_once(':').ok_or_else(malformed)?;
    if hours.is_empty()
        || hours.len() > 2
        || minutes.len() != 2
        || !hours.bytes().all(|b| b.is_ascii_digit())
        || !minutes.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(malformed());
    }

    let hours: u32 = hours.parse().map_err(|_| malformed())?;
    let minutes: u32 = minutes.parse().map_err(|_| malformed())?;

    if hours > 23 {
        return Err(TimeError::HourOutOfRange(hours));
    }
    if minutes > 59 {
        return Err(TimeError::MinuteOutOfRange(minutes));
    }

    Ok(hours * 60 + minutes)
}

/// Formats minutes since midnight as zero-padded `HH:mm`.
pub fn to_time_string(minutes: u32) -> Result<String, TimeError> {
    if minutes >= MINUTES_PER_DAY {
        return Err(TimeError::OffsetOutOfRange(minutes as i64));
    }
    Ok(format!("{:02}:{:02}", minutes / 60, minutes % 60))
}

/// A validated minute-of-day in `[00:00, 23:59]`.
///
/// Serializes as an `HH:mm` string; the database stores the raw minute count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    pub fn from_minutes(minutes: u32) -> Result<Self, TimeError> {
        if minutes >= MINUTES_PER_DAY {
            return Err(TimeError::OffsetOutOfRange(minutes as i64));
        }
        Ok(Self(minutes as u16))
    }

    pub fn minutes(self) -> u32 {
        u32::from(self.0)
    }
}

impl TryFrom<i32> for TimeOfDay {
    type Error = TimeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        let minutes = u32::try_from(value).map_err(|_| TimeError::OffsetOutOfRange(value.into()))?;
        Self::from_minutes(minutes)
    }
}

impl From<TimeOfDay> for i32 {
    fn from(value: TimeOfDay) -> Self {
        i32::from(value.0)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        to_minutes(s).map(|m| Self(m as u16))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
