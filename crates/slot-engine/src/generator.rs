//! Candidate generation -- lays an evenly spaced slot grid over the range.
//!
//! The grid starts at local midnight of `from`'s calendar day (in the anchor
//! timezone) so that slot boundaries line up with wall-clock hours, not with
//! whatever minute the caller happened to pass as `from`.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Result, SlotError};
use crate::slot::{Slot, TimeRange};

/// Generate every candidate slot of `slot_duration_minutes` between local
/// midnight of `from` and `to`.
///
/// A slot is emitted only if its end is strictly before `to`, so the slot
/// that would touch `to` is always dropped.
///
/// # Errors
/// Returns `SlotError::InvalidDuration` if `slot_duration_minutes <= 0` and
/// `SlotError::InvalidRange` if `to <= from`. Both are checked before any
/// slot is produced.
pub fn generate_candidates(
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    slot_duration_minutes: i64,
    anchor: Tz,
) -> Result<Vec<Slot>> {
    let step = slot_step(slot_duration_minutes)?;
    let range = TimeRange::new(from, to)?;

    let mut cursor = local_midnight(range.from, anchor);
    let mut slots = Vec::new();

    // A step that runs past the representable calendar ends the grid.
    while let Some(end) = cursor.checked_add_signed(step) {
        if cursor >= range.to {
            break;
        }
        if end < range.to {
            slots.push(Slot { start: cursor, end });
        }
        cursor = end;
    }

    Ok(slots)
}

/// The slot length as a [`Duration`].
///
/// # Errors
/// Returns `SlotError::InvalidDuration` unless `minutes` is positive and
/// representable.
pub fn slot_step(minutes: i64) -> Result<Duration> {
    if minutes <= 0 {
        return Err(SlotError::InvalidDuration(minutes));
    }
    Duration::try_minutes(minutes).ok_or(SlotError::InvalidDuration(minutes))
}

/// The instant at which `instant`'s calendar day begins in `tz`.
///
/// Where midnight falls into a DST gap the day begins at the first valid
/// local time after it.
pub fn local_midnight(instant: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let midnight = instant
        .with_timezone(&tz)
        .date_naive()
        .and_time(NaiveTime::MIN);

    (0..=2)
        .map(|h| midnight + Duration::hours(h))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(instant)
}
