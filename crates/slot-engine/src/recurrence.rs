//! RRULE expansion for recurring busy events.
//!
//! Wraps the `rrule` crate (v0.13) to turn a recurring calendar event into the
//! concrete busy intervals it occupies. Timezone handling follows the event's
//! `TZID`, so a weekly 09:00 meeting stays at 09:00 local time across DST.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rrule::RRuleSet;

use crate::slot::{BusyInterval, TimeRange};
use crate::source::SourceError;

/// Upper bound on in-range occurrences produced for a single recurring event.
pub const MAX_OCCURRENCES: u16 = 1000;

/// A recurring event as found in a calendar feed.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringEvent {
    /// The RRULE value, without the `RRULE:` prefix (e.g. `FREQ=WEEKLY;BYDAY=MO`).
    pub rrule: String,
    /// Local start of the first instance.
    pub dtstart: NaiveDateTime,
    /// IANA timezone the local times are expressed in.
    pub timezone: String,
    pub duration: Duration,
    /// Local start times of excluded instances.
    pub exdates: Vec<NaiveDateTime>,
}

fn ical_stamp(dt: &NaiveDateTime) -> String {
    dt.format("%Y%m%dT%H%M%S").to_string()
}

/// Expand the occurrences of a recurring event that overlap `range`.
///
/// Occurrences before the range are skipped rather than counted, so a rule
/// that started years earlier still blocks time inside it. At most `limit`
/// in-range occurrences are returned; excluded dates are removed by the rrule
/// set itself.
///
/// # Errors
/// Returns `SourceError::Recurrence` if the rule is empty or unparseable, or
/// if the timezone is not a valid IANA identifier.
pub fn expand_recurrence(
    event: &RecurringEvent,
    range: &TimeRange,
    limit: u16,
) -> Result<Vec<BusyInterval>, SourceError> {
    if event.rrule.trim().is_empty() {
        return Err(SourceError::Recurrence("empty RRULE string".to_string()));
    }

    let _tz: chrono_tz::Tz = event
        .timezone
        .parse()
        .map_err(|_| SourceError::Recurrence(format!("invalid timezone: {}", event.timezone)))?;

    let mut rrule_text = format!(
        "DTSTART;TZID={}:{}\nRRULE:{}",
        event.timezone,
        ical_stamp(&event.dtstart),
        event.rrule.trim()
    );

    if !event.exdates.is_empty() {
        let exdates: Vec<String> = event.exdates.iter().map(ical_stamp).collect();
        rrule_text.push_str(&format!(
            "\nEXDATE;TZID={}:{}",
            event.timezone,
            exdates.join(",")
        ));
    }

    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| SourceError::Recurrence(format!("{}", e)))?;

    // An occurrence starting one duration before `from` still reaches into it.
    let earliest = range
        .from
        .checked_sub_signed(event.duration)
        .unwrap_or(range.from);
    let instances = rrule_set
        .after(earliest.with_timezone(&rrule::Tz::UTC))
        .before(range.to.with_timezone(&rrule::Tz::UTC))
        .all(limit);

    Ok(instances
        .dates
        .into_iter()
        .filter_map(|dt| {
            let start: DateTime<Utc> = dt.with_timezone(&Utc);
            let end = start.checked_add_signed(event.duration)?;
            Some(BusyInterval::new(start, end))
        })
        .filter(|b| b.overlaps(range))
        .collect())
}
