//! Remove candidate slots that sit inside a busy interval.
//!
//! The test is containment, not overlap: a slot conflicts with a busy
//! interval only when the slot, widened by `padding` on both sides, lies
//! strictly inside it. A slot that merely overlaps the edge of a busy
//! interval is kept.

use chrono::Duration;

use crate::slot::{BusyInterval, Slot};

/// True when `slot`, padded by `padding` on each side, is strictly contained
/// in `busy`.
///
/// Equal boundaries are not containment: a padded slot starting exactly at
/// `busy.start` does not conflict.
///
/// A padding that pushes the slot past the representable calendar can never
/// fit inside a busy interval.
pub fn is_contained(slot: &Slot, busy: &BusyInterval, padding: Duration) -> bool {
    match (
        slot.start.checked_sub_signed(padding),
        slot.end.checked_add_signed(padding),
    ) {
        (Some(start), Some(end)) => start > busy.start && end < busy.end,
        _ => false,
    }
}

/// Keep only the slots that conflict with none of the busy intervals.
///
/// Busy intervals are treated as an unordered set; duplicates are harmless.
pub fn remove_conflicts(slots: Vec<Slot>, busy: &[BusyInterval], padding: Duration) -> Vec<Slot> {
    if busy.is_empty() {
        return slots;
    }

    slots
        .into_iter()
        .filter(|slot| !busy.iter().any(|b| is_contained(slot, b, padding)))
        .collect()
}
