//! Value types shared by every pipeline stage.
//!
//! All of these are immutable values created per invocation; nothing here is
//! persisted or shared between calls.

use chrono::{DateTime, Duration, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};

/// The requested search range. `to` must be strictly after `from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeRange {
    /// Build a range, rejecting empty and inverted ones.
    ///
    /// # Errors
    /// Returns `SlotError::InvalidRange` when `to <= from`.
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self> {
        if to <= from {
            return Err(SlotError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }
}

/// A candidate bookable interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Slot {
    /// A slot of `duration` from `start`, ending at the latest representable
    /// instant if the sum overflows.
    pub fn new(start: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            start,
            end: start
                .checked_add_signed(duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// An interval during which the subject is unavailable, as reported by a
/// [`BusyIntervalSource`](crate::source::BusyIntervalSource).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusyInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// True when this interval shares any instant with `range`.
    pub fn overlaps(&self, range: &TimeRange) -> bool {
        self.start < range.to && self.end > range.from
    }
}

/// A wall-clock time of day, written in requests as `[hour, minute?, second?]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl TimeOfDay {
    /// # Errors
    /// Returns `SlotError::InvalidTimeOfDay` if any component is out of range.
    pub fn new(hour: u32, minute: u32, second: u32) -> Result<Self> {
        if hour > 23 || minute > 59 || second > 59 {
            return Err(SlotError::InvalidTimeOfDay(format!(
                "{:02}:{:02}:{:02}",
                hour, minute, second
            )));
        }
        Ok(Self {
            hour,
            minute,
            second,
        })
    }

    /// Parse the `[h]`, `[h, m]` or `[h, m, s]` array form. Missing minute and
    /// second default to 0.
    pub fn from_parts(parts: &[u32]) -> Result<Self> {
        match parts {
            [h] => Self::new(*h, 0, 0),
            [h, m] => Self::new(*h, *m, 0),
            [h, m, s] => Self::new(*h, *m, *s),
            _ => Err(SlotError::InvalidTimeOfDay(format!(
                "expected [hour, minute?, second?], got {:?}",
                parts
            ))),
        }
    }

    pub fn to_naive_time(self) -> NaiveTime {
        // Components are range-checked in `new`.
        NaiveTime::from_hms_opt(self.hour, self.minute, self.second).unwrap_or(NaiveTime::MIN)
    }
}

/// A recurring daily window evaluated in a specific timezone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyWindow {
    pub timezone: Tz,
    pub from: TimeOfDay,
    pub to: TimeOfDay,
}

/// The set of allowed weekdays, numbered 0=Sunday..6=Saturday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn all() -> Self {
        Self(0b0111_1111)
    }

    /// # Errors
    /// Returns `SlotError::InvalidWeekday` for any number above 6.
    pub fn from_numbers(days: &[u8]) -> Result<Self> {
        let mut mask = 0u8;
        for &day in days {
            if day > 6 {
                return Err(SlotError::InvalidWeekday(day));
            }
            mask |= 1 << day;
        }
        Ok(Self(mask))
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0 & (1 << weekday.num_days_from_sunday()) != 0
    }
}

impl Default for WeekdaySet {
    fn default() -> Self {
        Self::all()
    }
}

