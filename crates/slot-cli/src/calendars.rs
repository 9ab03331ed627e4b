//! File-backed calendars for `--calendar-dir`.
//!
//! Each calendar id maps to `<dir>/<id>.ics` or, failing that,
//! `<dir>/<id>.json` holding a JSON array of `{start, end}` busy intervals.

use std::path::PathBuf;

use slot_engine::ics::parse_busy_intervals;
use slot_engine::source::BoxFuture;
use slot_engine::{BusyInterval, CalendarFetcher, SourceError, TimeRange};
use tracing::debug;

pub struct DirectoryCalendars {
    dir: PathBuf,
}

impl DirectoryCalendars {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    async fn read(
        &self,
        calendar_id: &str,
        range: TimeRange,
    ) -> Result<Vec<BusyInterval>, SourceError> {
        let fail = |message: String| SourceError::Fetch {
            calendar_id: calendar_id.to_string(),
            message,
        };

        if !is_plain_id(calendar_id) {
            return Err(fail("calendar id must be a plain file name".to_string()));
        }

        let ics_path = self.dir.join(format!("{}.ics", calendar_id));
        if let Ok(content) = tokio::fs::read_to_string(&ics_path).await {
            debug!(path = %ics_path.display(), "reading ICS calendar");
            return parse_busy_intervals(&content, &range);
        }

        let json_path = self.dir.join(format!("{}.json", calendar_id));
        let content = tokio::fs::read_to_string(&json_path)
            .await
            .map_err(|e| fail(format!("{}: {}", json_path.display(), e)))?;
        debug!(path = %json_path.display(), "reading JSON calendar");
        let intervals: Vec<BusyInterval> =
            serde_json::from_str(&content).map_err(|e| fail(e.to_string()))?;

        Ok(intervals.into_iter().filter(|b| b.overlaps(&range)).collect())
    }
}

/// Ids map to files directly inside the directory, so separators and dot
/// segments are rejected.
fn is_plain_id(calendar_id: &str) -> bool {
    !calendar_id.is_empty()
        && calendar_id != "."
        && calendar_id != ".."
        && !calendar_id.contains(['/', '\\'])
}

impl CalendarFetcher for DirectoryCalendars {
    fn fetch_calendar(
        &self,
        calendar_id: &str,
        range: TimeRange,
        _time_zone: Option<&str>,
    ) -> BoxFuture<'_, Result<Vec<BusyInterval>, SourceError>> {
        let calendar_id = calendar_id.to_string();
        Box::pin(async move { self.read(&calendar_id, range).await })
    }
}
