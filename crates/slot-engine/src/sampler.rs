//! Weighted sampling -- reduce many candidates to a representative few.
//!
//! The surviving slots are split into `count` contiguous chunks and one slot
//! is drawn from each. Within a chunk every slot starts with weight 1 and
//! each active [`Strategy`] adds `round(w(i) * (multiplier - 1))` on top.
//! The draw is a single lookup into the cumulative weight array.

use std::collections::HashSet;

use chrono_tz::Tz;
use rand::Rng;

use crate::slot::Slot;
use crate::strategy::Strategy;

/// Default bias multiplier: one extra unit of weight for a full-strength match.
pub const DEFAULT_WEIGHT_MULTIPLIER: f64 = 2.0;

/// Largest multiplier a request may ask for.
pub const MAX_WEIGHT_MULTIPLIER: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    /// Number of slots to return. `None` disables sampling.
    pub count: Option<usize>,
    pub strategies: Vec<Strategy>,
    pub weight_multiplier: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            count: None,
            strategies: vec![Strategy::Linear],
            weight_multiplier: DEFAULT_WEIGHT_MULTIPLIER,
        }
    }
}

/// Result of [`sample_slots`].
#[derive(Debug, Clone, PartialEq)]
pub struct SampleOutcome {
    /// The chosen slots, one per chunk, in chunk order.
    pub slots: Vec<Slot>,
    /// Indices of chunks where the redraw budget ran out and the fallback
    /// pick was used.
    pub exhausted_chunks: Vec<usize>,
}

/// Split `items` into exactly `parts` contiguous chunks.
///
/// Each chunk takes `ceil(remaining / remaining_parts)` items from the front,
/// so chunk sizes never grow toward the end: 32 items in 3 parts gives
/// 11, 11, 10. When `parts > items.len()` the trailing chunks are empty.
pub fn partition_shrinking<T>(items: &[T], parts: usize) -> Vec<&[T]> {
    let mut rest = items;
    let mut chunks = Vec::with_capacity(parts);
    for remaining_parts in (1..=parts).rev() {
        let take = rest.len().div_ceil(remaining_parts);
        let (head, tail) = rest.split_at(take);
        chunks.push(head);
        rest = tail;
    }
    chunks
}

/// Integer weight of every slot in `chunk` after stacking all strategies.
pub fn chunk_weights(
    chunk: &[Slot],
    strategies: &[Strategy],
    weight_multiplier: f64,
    timezone: Option<Tz>,
) -> Vec<u64> {
    let len = chunk.len();
    let scale = weight_multiplier - 1.0;

    chunk
        .iter()
        .enumerate()
        .map(|(i, slot)| {
            strategies
                .iter()
                .map(|s| {
                    let copies = (s.weight(i, len, slot, timezone) * scale).round();
                    if copies > 0.0 {
                        copies.min(MAX_WEIGHT_MULTIPLIER) as u64
                    } else {
                        0
                    }
                })
                .fold(1u64, u64::saturating_add)
        })
        .collect()
}

/// Draw an index with probability proportional to its weight.
///
/// `cumulative` must be non-empty and non-decreasing with a positive total.
fn weighted_draw<R: Rng>(cumulative: &[u64], rng: &mut R) -> usize {
    let total = cumulative[cumulative.len() - 1];
    let ticket = rng.random_range(0..total);
    cumulative.partition_point(|&c| c <= ticket)
}

/// Pick one slot per chunk.
///
/// Returns the input unchanged when `count` is `None` or not smaller than
/// the number of slots.
pub fn sample_slots<R: Rng>(
    slots: Vec<Slot>,
    config: &SamplingConfig,
    timezone: Option<Tz>,
    rng: &mut R,
) -> SampleOutcome {
    let count = match config.count {
        Some(count) if count < slots.len() => count,
        _ => {
            return SampleOutcome {
                slots,
                exhausted_chunks: Vec::new(),
            }
        }
    };

    let mut chosen: Vec<Slot> = Vec::with_capacity(count);
    let mut seen: HashSet<Slot> = HashSet::with_capacity(count);
    let mut exhausted_chunks = Vec::new();

    for (index, chunk) in partition_shrinking(&slots, count).into_iter().enumerate() {
        if chunk.is_empty() {
            continue;
        }

        let weights = chunk_weights(chunk, &config.strategies, config.weight_multiplier, timezone);
        let cumulative: Vec<u64> = weights
            .iter()
            .scan(0u64, |acc, w| {
                *acc = acc.saturating_add(*w);
                Some(*acc)
            })
            .collect();

        let mut pick = None;
        for _ in 0..chunk.len() {
            let candidate = chunk[weighted_draw(&cumulative, rng)];
            if !seen.contains(&candidate) {
                pick = Some(candidate);
                break;
            }
        }

        let pick = match pick {
            Some(slot) => slot,
            None => {
                exhausted_chunks.push(index);
                chunk
                    .iter()
                    .find(|s| !seen.contains(*s))
                    .copied()
                    .unwrap_or(chunk[0])
            }
        };

        seen.insert(pick);
        chosen.push(pick);
    }

    SampleOutcome {
        slots: chosen,
        exhausted_chunks,
    }
}
