//! Tests for chunking, weighting and the bounded-redraw sampler.

use std::collections::HashSet;

use chrono::{Duration, TimeZone, Utc};
use chrono_tz::Tz;
use rand::rngs::StdRng;
use rand::SeedableRng;
use slot_engine::sampler::{chunk_weights, partition_shrinking, sample_slots, SamplingConfig};
use slot_engine::slot::Slot;
use slot_engine::strategy::Strategy;

// ── Helpers ─────────────────────────────────────────────────────────────────

/// `n` consecutive 30-minute slots starting 2026-03-16T09:00Z.
fn slots(n: usize) -> Vec<Slot> {
    let first = Utc.with_ymd_and_hms(2026, 3, 16, 9, 0, 0).unwrap();
    (0..n)
        .map(|i| Slot::new(first + Duration::minutes(30 * i as i64), Duration::minutes(30)))
        .collect()
}

fn config(count: Option<usize>, strategies: &[&str], multiplier: f64) -> SamplingConfig {
    SamplingConfig {
        count,
        strategies: strategies.iter().map(|s| s.parse().unwrap()).collect(),
        weight_multiplier: multiplier,
    }
}

// ── Partitioning ────────────────────────────────────────────────────────────

#[test]
fn shrinking_partition_sizes() {
    let items: Vec<u32> = (0..32).collect();
    let sizes: Vec<usize> = partition_shrinking(&items, 3).iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![11, 11, 10]);

    let items: Vec<u32> = (0..10).collect();
    let sizes: Vec<usize> = partition_shrinking(&items, 4).iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![3, 3, 2, 2]);
}

#[test]
fn partition_is_contiguous_and_complete() {
    let items: Vec<u32> = (0..17).collect();
    let chunks = partition_shrinking(&items, 5);

    assert_eq!(chunks.len(), 5);
    let flattened: Vec<u32> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
    assert_eq!(flattened, items);
}

#[test]
fn more_parts_than_items_leaves_empty_tail_chunks() {
    let items = [1, 2];
    let chunks = partition_shrinking(&items, 4);
    let sizes: Vec<usize> = chunks.iter().map(|c| c.len()).collect();
    assert_eq!(sizes, vec![1, 1, 0, 0]);
}

// ── Weights ─────────────────────────────────────────────────────────────────

#[test]
fn linear_gives_uniform_weights() {
    assert_eq!(chunk_weights(&slots(4), &[Strategy::Linear], 2.0, None), vec![1, 1, 1, 1]);
}

#[test]
fn heavy_firsts_adds_rounded_copies() {
    let s = slots(4);
    let firsts = ["heavy-firsts".parse().unwrap()];
    // w = 1, .75, .5, .25 -> round(w * 1) = 1, 1, 1, 0
    assert_eq!(chunk_weights(&s, &firsts, 2.0, None), vec![2, 2, 2, 1]);
    // multiplier 3: round(w * 2) = 2, 2, 1, 1
    assert_eq!(chunk_weights(&s, &firsts, 3.0, None), vec![3, 3, 2, 2]);
}

#[test]
fn strategies_stack_additively() {
    let s = slots(4);
    let both: Vec<Strategy> = vec!["heavy-firsts".parse().unwrap(), "heavy-lasts".parse().unwrap()];
    // firsts: 1,1,1,0  lasts: 0,0,1,1
    assert_eq!(chunk_weights(&s, &both, 2.0, None), vec![2, 2, 3, 2]);
}

#[test]
fn multiplier_below_one_adds_nothing() {
    let firsts = ["heavy-firsts".parse().unwrap()];
    assert_eq!(chunk_weights(&slots(3), &firsts, 0.5, None), vec![1, 1, 1]);
}

#[test]
fn hour_strategy_uses_timezone() {
    // Slots start at 09:00, 09:30, 10:00 UTC, all mornings.
    let mornings = ["heavy-mornings".parse().unwrap()];
    assert_eq!(chunk_weights(&slots(3), &mornings, 2.0, Some(Tz::UTC)), vec![2, 2, 2]);
    assert_eq!(chunk_weights(&slots(3), &mornings, 2.0, None), vec![1, 1, 1]);
}

// ── Sampling ────────────────────────────────────────────────────────────────

#[test]
fn no_count_returns_everything() {
    let input = slots(10);
    let mut rng = StdRng::seed_from_u64(1);
    let outcome = sample_slots(input.clone(), &SamplingConfig::default(), None, &mut rng);
    assert_eq!(outcome.slots, input);
}

#[test]
fn count_at_or_above_len_is_identity() {
    let input = slots(5);
    let mut rng = StdRng::seed_from_u64(1);

    for count in [5, 6, 100] {
        let sampling = config(Some(count), &["heavy-firsts"], 4.0);
        let outcome = sample_slots(input.clone(), &sampling, None, &mut rng);
        assert_eq!(outcome.slots, input);
        assert!(outcome.exhausted_chunks.is_empty());
    }
}

#[test]
fn picks_one_unique_slot_per_chunk() {
    let input = slots(32);
    let chunks: Vec<Vec<Slot>> = partition_shrinking(&input, 3)
        .into_iter()
        .map(|c| c.to_vec())
        .collect();

    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let sampling = config(Some(3), &["linear"], 2.0);
        let outcome = sample_slots(input.clone(), &sampling, None, &mut rng);

        assert_eq!(outcome.slots.len(), 3);
        let unique: HashSet<_> = outcome.slots.iter().collect();
        assert_eq!(unique.len(), 3);
        for (picked, chunk) in outcome.slots.iter().zip(&chunks) {
            assert!(chunk.contains(picked), "pick must come from its own chunk");
        }
        assert!(outcome.slots.windows(2).all(|w| w[0].start < w[1].start));
    }
}

#[test]
fn same_seed_same_sample() {
    let cfg = config(Some(4), &["heavy-corners"], 3.0);
    let a = sample_slots(slots(40), &cfg, None, &mut StdRng::seed_from_u64(9));
    let b = sample_slots(slots(40), &cfg, None, &mut StdRng::seed_from_u64(9));
    assert_eq!(a, b);
}

#[test]
fn weighting_biases_the_draw() {
    // Two slots, one chunk. heavy-lasts with multiplier 101 gives weights 1 and 51.
    let input = slots(2);
    let cfg = config(Some(1), &["heavy-lasts"], 101.0);
    let mut rng = StdRng::seed_from_u64(42);

    let last_picked = (0..1000)
        .filter(|_| sample_slots(input.clone(), &cfg, None, &mut rng).slots[0] == input[1])
        .count();

    assert!(last_picked > 900, "last slot picked only {} times", last_picked);
}

#[test]
fn huge_multiplier_saturates_instead_of_overflowing() {
    let input = slots(10);
    let cfg = config(Some(2), &["heavy-firsts", "heavy-lasts"], 1e300);

    let weights = chunk_weights(&input, &cfg.strategies, cfg.weight_multiplier, None);
    assert!(weights.iter().all(|&w| w >= 1));

    let mut rng = StdRng::seed_from_u64(5);
    let outcome = sample_slots(input.clone(), &cfg, None, &mut rng);
    assert_eq!(outcome.slots.len(), 2);
    assert_ne!(outcome.slots[0], outcome.slots[1]);
}

#[test]
fn nan_multiplier_adds_no_weight() {
    let weights = chunk_weights(&slots(4), &[Strategy::Linear], f64::NAN, None);
    assert_eq!(weights, vec![1, 1, 1, 1]);
    let heavy: Strategy = "heavy-firsts".parse().unwrap();
    assert_eq!(chunk_weights(&slots(4), &[heavy], f64::NAN, None), vec![1, 1, 1, 1]);
}

#[test]
fn exhausted_redraws_fall_back_deterministically() {
    // Duplicated input: the second chunk holds only a slot already chosen, so
    // every redraw collides and the fallback has to force a pick.
    let s = slots(1)[0];
    let input = vec![s, s, s];
    let mut rng = StdRng::seed_from_u64(3);

    let outcome = sample_slots(input, &config(Some(2), &["linear"], 2.0), None, &mut rng);

    assert_eq!(outcome.slots, vec![s, s]);
    assert_eq!(outcome.exhausted_chunks, vec![1]);
}

#[test]
fn fallback_prefers_first_unused_slot() {
    // Chunks: [a, a] and [a, b]. Whatever the draws, the second pick is never `a`.
    let all = slots(2);
    let (a, b) = (all[0], all[1]);
    let input = vec![a, a, a, b];

    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let sampling = config(Some(2), &["linear"], 2.0);
        let outcome = sample_slots(input.clone(), &sampling, None, &mut rng);
        assert_eq!(outcome.slots, vec![a, b]);
    }
}

#[test]
fn zero_count_yields_nothing() {
    let mut rng = StdRng::seed_from_u64(1);
    let outcome = sample_slots(slots(5), &config(Some(0), &["linear"], 2.0), None, &mut rng);
    assert!(outcome.slots.is_empty());
}
