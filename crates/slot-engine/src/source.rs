//! Busy-interval sources -- where the pipeline learns when the subject is busy.
//!
//! The pipeline only sees the [`BusyIntervalSource`] trait. Implementations
//! in this crate:
//!
//! - [`StaticBusySource`] -- a fixed list, handy for tests and precomputed data
//! - [`IcsFeedSource`](crate::ics::IcsFeedSource) -- an iCalendar feed
//! - [`CalendarFanOut`] -- one [`CalendarFetcher`] call per calendar, at most
//!   [`DEFAULT_FAN_OUT`] in flight, merged into one list
//!
//! Authentication, HTTP and token refresh belong to whoever implements
//! [`CalendarFetcher`]; nothing here holds a client.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::slot::{BusyInterval, TimeRange};

/// Maximum number of calendar fetches in flight at once.
pub const DEFAULT_FAN_OUT: usize = 5;

/// A boxed future, so the source traits stay object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors raised while fetching busy intervals.
#[derive(Error, Debug)]
pub enum SourceError {
    /// A calendar backend reported a failure.
    #[error("fetching calendar '{calendar_id}' failed: {message}")]
    Fetch {
        calendar_id: String,
        message: String,
    },

    /// The ICS document could not be parsed.
    #[error("ICS parse error: {0}")]
    Ics(String),

    /// A recurrence rule could not be expanded.
    #[error("recurrence error: {0}")]
    Recurrence(String),

    /// A fan-out task panicked or was cancelled.
    #[error("fetch task failed: {0}")]
    Task(String),
}

/// Whose calendars to query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySelector {
    pub calendar_ids: Vec<String>,
    /// IANA timezone forwarded to backends that localize their responses.
    pub time_zone: Option<String>,
}

impl Default for IdentitySelector {
    fn default() -> Self {
        Self {
            calendar_ids: vec!["primary".to_string()],
            time_zone: None,
        }
    }
}

/// Supplies the busy intervals that candidate slots are checked against.
pub trait BusyIntervalSource: Send + Sync {
    /// Fetch every busy interval relevant to `range` for `identity`.
    ///
    /// The result is an unordered collection; duplicates are allowed.
    fn fetch_busy_intervals<'a>(
        &'a self,
        range: TimeRange,
        identity: &'a IdentitySelector,
    ) -> BoxFuture<'a, Result<Vec<BusyInterval>, SourceError>>;
}

/// A fixed, in-memory list of busy intervals.
#[derive(Debug, Clone, Default)]
pub struct StaticBusySource {
    intervals: Vec<BusyInterval>,
}

impl StaticBusySource {
    pub fn new(intervals: Vec<BusyInterval>) -> Self {
        Self { intervals }
    }
}

impl BusyIntervalSource for StaticBusySource {
    fn fetch_busy_intervals<'a>(
        &'a self,
        range: TimeRange,
        _identity: &'a IdentitySelector,
    ) -> BoxFuture<'a, Result<Vec<BusyInterval>, SourceError>> {
        Box::pin(async move {
            Ok(self
                .intervals
                .iter()
                .filter(|b| b.overlaps(&range))
                .copied()
                .collect())
        })
    }
}

/// Fetches busy intervals for a single calendar.
pub trait CalendarFetcher: Send + Sync {
    fn fetch_calendar(
        &self,
        calendar_id: &str,
        range: TimeRange,
        time_zone: Option<&str>,
    ) -> BoxFuture<'_, Result<Vec<BusyInterval>, SourceError>>;
}

/// Queries every selected calendar concurrently and merges the results.
///
/// If any calendar fails, the remaining fetches are aborted and the error is
/// returned; no partial list is ever produced.
#[derive(Clone)]
pub struct CalendarFanOut {
    fetcher: Arc<dyn CalendarFetcher>,
    concurrency: usize,
}

impl CalendarFanOut {
    pub fn new(fetcher: Arc<dyn CalendarFetcher>) -> Self {
        Self {
            fetcher,
            concurrency: DEFAULT_FAN_OUT,
        }
    }

    /// Override the in-flight limit. Values below 1 are treated as 1.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }
}

impl BusyIntervalSource for CalendarFanOut {
    fn fetch_busy_intervals<'a>(
        &'a self,
        range: TimeRange,
        identity: &'a IdentitySelector,
    ) -> BoxFuture<'a, Result<Vec<BusyInterval>, SourceError>> {
        Box::pin(async move {
            debug!(
                calendars = identity.calendar_ids.len(),
                limit = self.concurrency,
                "fanning out busy interval fetches"
            );

            let permits = Arc::new(Semaphore::new(self.concurrency));
            let mut tasks = JoinSet::new();

            for calendar_id in &identity.calendar_ids {
                let fetcher = Arc::clone(&self.fetcher);
                let permits = Arc::clone(&permits);
                let calendar_id = calendar_id.clone();
                let time_zone = identity.time_zone.clone();

                tasks.spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .map_err(|e| SourceError::Task(e.to_string()))?;
                    fetcher
                        .fetch_calendar(&calendar_id, range, time_zone.as_deref())
                        .await
                });
            }

            // Dropping `tasks` on early return aborts whatever is still running.
            let mut merged = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                let intervals = joined.map_err(|e| SourceError::Task(e.to_string()))??;
                merged.extend(intervals);
            }

            Ok(merged)
        })
    }
}
