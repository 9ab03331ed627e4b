//! The end-to-end slot computation.
//!
//! generate -> window filter -> fetch busy -> remove conflicts -> user
//! filter -> sample. Every stage except the fetch is synchronous and pure;
//! the fetch is the only await point.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rand::Rng;
use tracing::{debug, warn};

use crate::conflict::remove_conflicts;
use crate::error::Result;
use crate::generator::generate_candidates;
use crate::request::SlotQuery;
use crate::sampler::sample_slots;
use crate::slot::{BusyInterval, Slot};
use crate::source::BusyIntervalSource;
use crate::window::filter_by_window;

/// Receives diagnostic events at fixed points of the pipeline.
pub type LogSink = Arc<dyn Fn(&PipelineEvent) + Send + Sync>;

/// Caller-supplied predicate applied after conflict removal.
pub type SlotFilter = Arc<dyn Fn(&Slot) -> bool + Send + Sync>;

/// Observational events emitted to a [`LogSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Candidates left after generation and window filtering.
    CandidatesGenerated { count: usize },
    BusyIntervalsFetched { count: usize, elapsed: Duration },
    /// No busy source was configured.
    BusyIntervalsSkipped,
    Sampled { recommended: usize },
    /// A chunk ran out of redraws and used the fallback pick.
    SamplingExhausted { chunk: usize },
}

impl fmt::Display for PipelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineEvent::CandidatesGenerated { count } => {
                write!(f, "generated {} candidate slots", count)
            }
            PipelineEvent::BusyIntervalsFetched { count, elapsed } => {
                write!(f, "fetched {} busy intervals in {}ms", count, elapsed.as_millis())
            }
            PipelineEvent::BusyIntervalsSkipped => f.write_str("busy interval fetch skipped"),
            PipelineEvent::Sampled { recommended } => {
                write!(f, "recommending {} slots", recommended)
            }
            PipelineEvent::SamplingExhausted { chunk } => {
                write!(f, "sampling exhausted redraws in chunk {}, used fallback", chunk)
            }
        }
    }
}

/// A query plus the collaborators it runs against.
#[derive(Clone)]
pub struct SlotOptions {
    pub query: SlotQuery,
    /// `None` disables conflict checking.
    pub busy_source: Option<Arc<dyn BusyIntervalSource>>,
    pub slot_filter: Option<SlotFilter>,
    pub log: Option<LogSink>,
}

impl SlotOptions {
    pub fn new(query: SlotQuery) -> Self {
        Self {
            query,
            busy_source: None,
            slot_filter: None,
            log: None,
        }
    }

    pub fn with_busy_source(mut self, source: Arc<dyn BusyIntervalSource>) -> Self {
        self.busy_source = Some(source);
        self
    }

    pub fn with_slot_filter(mut self, filter: SlotFilter) -> Self {
        self.slot_filter = Some(filter);
        self
    }

    pub fn with_log(mut self, log: LogSink) -> Self {
        self.log = Some(log);
        self
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(log) = &self.log {
            log(&event);
        }
    }
}

/// Compute available slots, sampling with the thread-local RNG.
///
/// # Errors
/// Validation errors for the query, or `SlotError::BusySource` if the busy
/// source fails. A failed fetch never yields a partial result.
pub async fn compute_slots(options: &SlotOptions) -> Result<Vec<Slot>> {
    let candidates = candidate_slots(options, Utc::now())?;
    let busy = fetch_busy(options).await?;
    Ok(select_slots(options, candidates, &busy, &mut rand::rng()))
}

/// Like [`compute_slots`] with an explicit clock and RNG.
pub async fn compute_slots_with<R: Rng>(
    options: &SlotOptions,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<Slot>> {
    let candidates = candidate_slots(options, now)?;
    let busy = fetch_busy(options).await?;
    Ok(select_slots(options, candidates, &busy, rng))
}

/// Generate the grid and apply the window constraints.
pub fn candidate_slots(options: &SlotOptions, now: DateTime<Utc>) -> Result<Vec<Slot>> {
    let query = &options.query;
    let grid = generate_candidates(
        query.range.from,
        query.range.to,
        query.slot_duration_minutes,
        query.window.anchor_timezone(),
    )?;
    let candidates = filter_by_window(grid, &query.range, &query.window, now);

    debug!(count = candidates.len(), "generated candidate slots");
    options.emit(PipelineEvent::CandidatesGenerated {
        count: candidates.len(),
    });
    Ok(candidates)
}

async fn fetch_busy(options: &SlotOptions) -> Result<Vec<BusyInterval>> {
    let Some(source) = &options.busy_source else {
        debug!("no busy interval source, skipping fetch");
        options.emit(PipelineEvent::BusyIntervalsSkipped);
        return Ok(Vec::new());
    };

    let started = Instant::now();
    let busy = source
        .fetch_busy_intervals(options.query.range, &options.query.identity)
        .await?;
    let elapsed = started.elapsed();

    debug!(
        count = busy.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "fetched busy intervals"
    );
    options.emit(PipelineEvent::BusyIntervalsFetched {
        count: busy.len(),
        elapsed,
    });
    Ok(busy)
}

/// Remove conflicts, apply the user filter and sample.
pub fn select_slots<R: Rng>(
    options: &SlotOptions,
    candidates: Vec<Slot>,
    busy: &[BusyInterval],
    rng: &mut R,
) -> Vec<Slot> {
    let query = &options.query;
    let padding = chrono::Duration::try_minutes(query.padding_minutes)
        .unwrap_or(chrono::Duration::MAX);

    let mut free = remove_conflicts(candidates, busy, padding);
    if let Some(filter) = &options.slot_filter {
        free.retain(|slot| filter(slot));
    }

    let outcome = sample_slots(free, &query.sampling, query.timezone(), rng);
    for chunk in &outcome.exhausted_chunks {
        warn!(chunk, "sampling exhausted redraws, used fallback slot");
        options.emit(PipelineEvent::SamplingExhausted { chunk: *chunk });
    }

    debug!(recommended = outcome.slots.len(), "sampled slots");
    options.emit(PipelineEvent::Sampled {
        recommended: outcome.slots.len(),
    });
    outcome.slots
}
