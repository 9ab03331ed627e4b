//! iCalendar feed source.
//!
//! Every VEVENT in the feed becomes one busy interval, or several when it
//! carries an RRULE. Transparent and cancelled events do not block time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{
    Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike,
    Property,
};
use tracing::{debug, warn};

use crate::recurrence::{expand_recurrence, RecurringEvent, MAX_OCCURRENCES};
use crate::slot::{BusyInterval, TimeRange};
use crate::source::{BoxFuture, BusyIntervalSource, IdentitySelector, SourceError};

/// Busy intervals read from an ICS document held in memory.
///
/// The feed belongs to a single identity, so the selector is ignored.
#[derive(Debug, Clone)]
pub struct IcsFeedSource {
    content: String,
}

impl IcsFeedSource {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

impl BusyIntervalSource for IcsFeedSource {
    fn fetch_busy_intervals<'a>(
        &'a self,
        range: TimeRange,
        _identity: &'a IdentitySelector,
    ) -> BoxFuture<'a, Result<Vec<BusyInterval>, SourceError>> {
        Box::pin(async move { parse_busy_intervals(&self.content, &range) })
    }
}

/// Parse an ICS document and return the busy intervals overlapping `range`.
///
/// # Errors
/// Returns `SourceError::Ics` if the document is not valid iCalendar.
pub fn parse_busy_intervals(
    ics: &str,
    range: &TimeRange,
) -> Result<Vec<BusyInterval>, SourceError> {
    let calendar: Calendar = ics.parse().map_err(SourceError::Ics)?;

    let intervals: Vec<BusyInterval> = calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => Some(event_intervals(event, range)),
            _ => None,
        })
        .flatten()
        .filter(|b| b.overlaps(range))
        .collect();

    debug!(count = intervals.len(), "parsed busy intervals from ICS feed");
    Ok(intervals)
}

/// A resolved DTSTART/DTEND value.
struct EventTime {
    utc: DateTime<Utc>,
    local: NaiveDateTime,
    timezone: String,
}

fn event_intervals(event: &Event, range: &TimeRange) -> Vec<BusyInterval> {
    if is_free(event) {
        return Vec::new();
    }

    let Some(start) = event.get_start().map(resolve_time) else {
        warn!(uid = ?event.get_uid(), "skipping VEVENT without DTSTART");
        return Vec::new();
    };
    let end = match event.get_end() {
        Some(end) => resolve_time(end),
        None => EventTime {
            utc: start.utc,
            local: start.local,
            timezone: start.timezone.clone(),
        },
    };

    let single = BusyInterval::new(start.utc, end.utc);

    let Some(rule) = event.property_value("RRULE") else {
        return vec![single];
    };

    let recurring = RecurringEvent {
        rrule: rule.to_string(),
        dtstart: start.local,
        timezone: start.timezone.clone(),
        duration: end.utc - start.utc,
        exdates: exdates(event, &start),
    };

    match expand_recurrence(&recurring, range, MAX_OCCURRENCES) {
        Ok(occurrences) => occurrences,
        Err(e) => {
            warn!(
                uid = ?event.get_uid(),
                error = %e,
                "could not expand RRULE, using first instance"
            );
            vec![single]
        }
    }
}

fn is_free(event: &Event) -> bool {
    let transparent = event
        .property_value("TRANSP")
        .is_some_and(|v| v.eq_ignore_ascii_case("TRANSPARENT"));
    let cancelled = event
        .property_value("STATUS")
        .is_some_and(|v| v.eq_ignore_ascii_case("CANCELLED"));
    transparent || cancelled
}

fn resolve_time(value: DatePerhapsTime) -> EventTime {
    match value {
        DatePerhapsTime::Date(date) => utc_time(date.and_time(NaiveTime::MIN)),
        DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => EventTime {
            utc: dt,
            local: dt.naive_utc(),
            timezone: "UTC".to_string(),
        },
        DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => utc_time(naive),
        DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
            match tzid.parse::<Tz>() {
                Ok(tz) => EventTime {
                    utc: tz
                        .from_local_datetime(&date_time)
                        .earliest()
                        .map(|dt| dt.with_timezone(&Utc))
                        .unwrap_or_else(|| date_time.and_utc()),
                    local: date_time,
                    timezone: tz.name().to_string(),
                },
                Err(_) => {
                    warn!(tzid = %tzid, "unknown TZID, assuming UTC");
                    utc_time(date_time)
                }
            }
        }
    }
}

fn utc_time(naive: NaiveDateTime) -> EventTime {
    EventTime {
        utc: naive.and_utc(),
        local: naive,
        timezone: "UTC".to_string(),
    }
}

/// Every EXDATE of `event`, as local times in the zone of its DTSTART.
///
/// EXDATE may repeat, and each line may carry its own TZID or use UTC
/// (`Z`) values; all of them are converted to DTSTART's zone so they line up
/// with the generated occurrences. Date-only values exclude the occurrence
/// starting at DTSTART's time of day on that date.
fn exdates(event: &Event, start: &EventTime) -> Vec<NaiveDateTime> {
    let event_tz: Tz = start.timezone.parse().unwrap_or(Tz::UTC);

    event
        .multi_properties()
        .get("EXDATE")
        .into_iter()
        .flatten()
        .flat_map(|property| exdate_values(property, event_tz, start.local.time()))
        .collect()
}

fn exdate_values(
    property: &Property,
    event_tz: Tz,
    start_time: NaiveTime,
) -> Vec<NaiveDateTime> {
    let value_tz: Option<Tz> = property
        .params()
        .get("TZID")
        .and_then(|p| p.value().parse().ok());

    property
        .value()
        .split(',')
        .filter_map(|raw| {
            let raw = raw.trim();
            if let Some(utc) = raw.strip_suffix('Z') {
                let naive = NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S").ok()?;
                return Some(naive.and_utc().with_timezone(&event_tz).naive_local());
            }
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y%m%dT%H%M%S") {
                return Some(match value_tz {
                    Some(tz) if tz != event_tz => tz
                        .from_local_datetime(&naive)
                        .earliest()
                        .map(|dt| dt.with_timezone(&event_tz).naive_local())
                        .unwrap_or(naive),
                    _ => naive,
                });
            }
            NaiveDate::parse_from_str(raw, "%Y%m%d")
                .ok()
                .map(|d| d.and_time(start_time))
        })
        .collect()
}
