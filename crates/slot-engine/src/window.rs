//! Window filtering -- weekday, daily time-of-day and past-slot constraints.
//!
//! A candidate survives only if all four checks pass:
//!
//! 1. both its start and end fall on an allowed weekday;
//! 2. the coarse range check: start is after `from`'s date at the daily
//!    start time and end is before `to`'s date at the daily end time, with
//!    both anchors read as UTC wall-clock times;
//! 3. the exact check in the daily window's timezone, anchored to the
//!    slot's own local day;
//! 4. start is after `now`.
//!
//! Checks 2 and 3 only run when a daily window is configured. Check 2 anchors
//! to the requested range while check 3 anchors to each slot, so neither one
//! subsumes the other.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;

use crate::slot::{DailyWindow, Slot, TimeRange, WeekdaySet};

/// Constraints applied by [`filter_by_window`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowConstraints {
    pub days: WeekdaySet,
    pub daily: Option<DailyWindow>,
}

impl WindowConstraints {
    /// Timezone in which weekdays are read: the daily window's zone, or UTC.
    pub fn anchor_timezone(&self) -> Tz {
        self.daily.map(|d| d.timezone).unwrap_or(Tz::UTC)
    }
}

/// Keep the slots that satisfy every window constraint, preserving order.
pub fn filter_by_window(
    slots: Vec<Slot>,
    range: &TimeRange,
    constraints: &WindowConstraints,
    now: DateTime<Utc>,
) -> Vec<Slot> {
    let anchor = constraints.anchor_timezone();

    slots
        .into_iter()
        .filter(|slot| on_allowed_days(slot, constraints.days, anchor))
        .filter(|slot| match &constraints.daily {
            Some(daily) => {
                within_range_window(slot, range, daily) && within_daily_window(slot, daily)
            }
            None => true,
        })
        .filter(|slot| slot.start > now)
        .collect()
}

fn on_allowed_days(slot: &Slot, days: WeekdaySet, tz: Tz) -> bool {
    days.contains(slot.start.with_timezone(&tz).weekday())
        && days.contains(slot.end.with_timezone(&tz).weekday())
}

/// The coarse pre-filter, anchored to the range's own first and last dates.
fn within_range_window(slot: &Slot, range: &TimeRange, daily: &DailyWindow) -> bool {
    let earliest = range
        .from
        .date_naive()
        .and_time(daily.from.to_naive_time())
        .and_utc();
    let latest = range
        .to
        .date_naive()
        .and_time(daily.to.to_naive_time())
        .and_utc();

    slot.start > earliest && slot.end < latest
}

/// The authoritative check: the slot must sit inside the daily window of the
/// local day on which it starts.
fn within_daily_window(slot: &Slot, daily: &DailyWindow) -> bool {
    let start_local = slot.start.with_timezone(&daily.timezone).naive_local();
    let end_local = slot.end.with_timezone(&daily.timezone).naive_local();
    let day = start_local.date();

    let window_start = day.and_time(daily.from.to_naive_time());
    let window_end = day.and_time(daily.to.to_naive_time());

    start_local >= window_start && end_local <= window_end
}
