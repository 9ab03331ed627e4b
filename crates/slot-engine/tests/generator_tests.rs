//! Tests for candidate grid generation.

use chrono::{Duration, TimeZone, Utc};
use chrono_tz::Tz;
use slot_engine::generator::{generate_candidates, local_midnight};
use slot_engine::SlotError;

#[test]
fn grid_starts_at_local_midnight_of_from() {
    let from = Utc.with_ymd_and_hms(2026, 3, 16, 9, 17, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2026, 3, 16, 12, 0, 0).unwrap();

    let slots = generate_candidates(from, to, 30, Tz::UTC).unwrap();

    assert_eq!(
        slots[0].start,
        Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap()
    );
}

#[test]
fn slot_touching_to_is_dropped() {
    // 00:00-02:00 with 30-min slots: 00:00, 00:30, 01:00 survive; 01:30-02:00
    // ends exactly at `to` and is dropped.
    let from = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2026, 3, 16, 2, 0, 0).unwrap();

    let slots = generate_candidates(from, to, 30, Tz::UTC).unwrap();

    assert_eq!(slots.len(), 3);
    assert_eq!(
        slots.last().unwrap().end,
        Utc.with_ymd_and_hms(2026, 3, 16, 1, 30, 0).unwrap()
    );
}

#[test]
fn partial_trailing_slot_is_dropped() {
    let from = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2026, 3, 16, 1, 45, 0).unwrap();

    let slots = generate_candidates(from, to, 30, Tz::UTC).unwrap();

    // 00:00, 00:30, 01:00 -> 01:30 end is before 01:45; 01:30-02:00 would pass `to`.
    assert_eq!(slots.len(), 3);
}

#[test]
fn every_slot_has_requested_length_and_grid_is_increasing() {
    let from = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2026, 3, 18, 0, 0, 0).unwrap();

    let slots = generate_candidates(from, to, 45, Tz::UTC).unwrap();

    assert!(!slots.is_empty());
    for slot in &slots {
        assert_eq!(slot.duration(), Duration::minutes(45));
    }
    for pair in slots.windows(2) {
        assert!(pair[0].end <= pair[1].start, "slots must not overlap");
        assert!(pair[0].start < pair[1].start, "starts must increase");
    }
}

#[test]
fn zero_or_negative_duration_is_rejected() {
    let from = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2026, 3, 17, 0, 0, 0).unwrap();

    assert!(matches!(
        generate_candidates(from, to, 0, Tz::UTC),
        Err(SlotError::InvalidDuration(0))
    ));
    assert!(matches!(
        generate_candidates(from, to, -15, Tz::UTC),
        Err(SlotError::InvalidDuration(-15))
    ));
}

#[test]
fn inverted_range_is_rejected() {
    let from = Utc.with_ymd_and_hms(2026, 3, 17, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();

    assert!(matches!(
        generate_candidates(from, to, 30, Tz::UTC),
        Err(SlotError::InvalidRange { .. })
    ));
    assert!(matches!(
        generate_candidates(from, from, 30, Tz::UTC),
        Err(SlotError::InvalidRange { .. })
    ));
}

#[test]
fn local_midnight_follows_anchor_timezone() {
    // 2026-03-16T03:00Z is still 2026-03-15 in New York (EDT, UTC-4).
    let instant = Utc.with_ymd_and_hms(2026, 3, 16, 3, 0, 0).unwrap();
    let tz: Tz = "America/New_York".parse().unwrap();

    assert_eq!(
        local_midnight(instant, tz),
        Utc.with_ymd_and_hms(2026, 3, 15, 4, 0, 0).unwrap()
    );
    assert_eq!(
        local_midnight(instant, Tz::UTC),
        Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap()
    );
}

#[test]
fn step_past_the_calendar_end_yields_no_slots() {
    // Representable as a time delta, but from + step overflows the calendar.
    let from = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2026, 3, 20, 0, 0, 0).unwrap();

    let slots = generate_candidates(from, to, 10_000_000_000_000, Tz::UTC).unwrap();

    assert!(slots.is_empty());
}

#[test]
fn unrepresentable_duration_is_rejected() {
    let from = Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2026, 3, 20, 0, 0, 0).unwrap();

    assert!(matches!(
        generate_candidates(from, to, i64::MAX, Tz::UTC),
        Err(SlotError::InvalidDuration(i64::MAX))
    ));
}
