//! Error types for slot-engine operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::source::SourceError;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Invalid slot duration: {0} minutes (must be > 0)")]
    InvalidDuration(i64),

    #[error("Invalid padding: {0} minutes (must be >= 0 and fit the range)")]
    InvalidPadding(i64),

    #[error("Invalid weight multiplier: {0} (must be finite, between 0 and 1000000)")]
    InvalidWeightMultiplier(f64),

    #[error("Invalid range: `to` ({to}) must be after `from` ({from})")]
    InvalidRange {
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    #[error("Invalid weekday: {0} (expected 0=Sunday..6=Saturday)")]
    InvalidWeekday(u8),

    #[error("Unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("Busy interval source failed: {0}")]
    BusySource(#[from] SourceError),
}

pub type Result<T> = std::result::Result<T, SlotError>;
