//! # slot-engine
//!
//! Finds available meeting slots in a time range.
//!
//! A request lays a grid of equal slots over the range, narrows it to the
//! allowed weekdays and a timezone-aware daily window, removes slots that sit
//! inside busy intervals reported by a [`BusyIntervalSource`], and, when a
//! target count is given, draws a weighted-random representative from each
//! of `count` chunks.
//!
//! ## Modules
//!
//! - [`generator`] — range + duration → evenly spaced candidate grid
//! - [`window`] — weekday, daily-window and past-slot filtering
//! - [`conflict`] — padded containment test against busy intervals
//! - [`strategy`] — named weighting rules (`heavy-firsts`, `heavy-mondays`, ...)
//! - [`sampler`] — shrinking partition + weighted draw with bounded redraws
//! - [`source`] — busy interval sources, including the bounded calendar fan-out
//! - [`ics`] — iCalendar feed source
//! - [`recurrence`] — RRULE expansion for recurring busy events
//! - [`request`] — JSON request → validated query
//! - [`pipeline`] — the `compute_slots` entry point
//! - [`error`] — Error types

pub mod conflict;
pub mod error;
pub mod generator;
pub mod ics;
pub mod pipeline;
pub mod recurrence;
pub mod request;
pub mod sampler;
pub mod slot;
pub mod source;
pub mod strategy;
pub mod window;

pub use error::SlotError;
pub use ics::IcsFeedSource;
pub use pipeline::{compute_slots, compute_slots_with, PipelineEvent, SlotOptions};
pub use request::{SlotQuery, SlotRequest};
pub use slot::{BusyInterval, DailyWindow, Slot, TimeOfDay, TimeRange, WeekdaySet};
pub use source::{
    BusyIntervalSource, CalendarFanOut, CalendarFetcher, IdentitySelector, SourceError,
    StaticBusySource,
};
pub use strategy::Strategy;
