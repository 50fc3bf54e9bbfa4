//! Emotion histogram: per-category counts and rounded percentages.
//!
//! The running histogram evolves on its own timer and is intentionally not
//! reconciled with the event store. `histogram_from_events` is available
//! when a caller wants the store's own distribution instead.

use crate::events::{Category, DetectionEvent};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;

/// Order buckets are reported in.
pub const DISPLAY_ORDER: [Category; 8] = [
    Category::Happy,
    Category::Neutral,
    Category::Surprised,
    Category::Sad,
    Category::Angry,
    Category::Fear,
    Category::Disgust,
    Category::Sadness,
];

/// Counts the running histogram starts from (they sum to 100).
pub const SEED_COUNTS: [(Category, u64); 8] = [
    (Category::Happy, 25),
    (Category::Neutral, 20),
    (Category::Surprised, 15),
    (Category::Sad, 12),
    (Category::Angry, 10),
    (Category::Fear, 8),
    (Category::Disgust, 6),
    (Category::Sadness, 4),
];

/// Largest per-tick increment of a single category.
const MAX_TICK_STEP: u64 = 2;

/// One category's share of the histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistogramBucket {
    pub category: Category,
    pub count: u64,
    pub percentage: u8,
}

/// Build buckets from raw counts.
///
/// Percentages are rounded half-up independently per bucket and are not
/// renormalized, so their sum may drift from 100 by up to half the number
/// of buckets.
pub fn recompute(counts: &HashMap<Category, u64>) -> Vec<HistogramBucket> {
    let total: u64 = DISPLAY_ORDER
        .iter()
        .map(|c| counts.get(c).copied().unwrap_or(0))
        .sum();

    DISPLAY_ORDER
        .iter()
        .map(|&category| {
            let count = counts.get(&category).copied().unwrap_or(0);
            HistogramBucket {
                category,
                count,
                percentage: percentage(count, total),
            }
        })
        .collect()
}

/// Histogram of the categories in a store snapshot.
pub fn histogram_from_events(events: &[DetectionEvent]) -> Vec<HistogramBucket> {
    let mut counts: HashMap<Category, u64> = HashMap::new();
    for event in events {
        *counts.entry(event.category()).or_insert(0) += 1;
    }
    recompute(&counts)
}

fn percentage(count: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    // round(100 * count / total), halves rounded up
    let rounded = (200 * count + total) / (2 * total);
    rounded.min(100) as u8
}

/// The independently evolving running histogram.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistogramState {
    buckets: Vec<HistogramBucket>,
}

impl HistogramState {
    /// Start from the given counts.
    pub fn from_counts(counts: &HashMap<Category, u64>) -> Self {
        Self {
            buckets: recompute(counts),
        }
    }

    /// Advance one tick: each category grows by 0, 1 or 2, then the
    /// percentages are recomputed from the updated totals.
    pub fn advance<R: Rng + ?Sized>(prev: &HistogramState, rng: &mut R) -> HistogramState {
        let counts: HashMap<Category, u64> = prev
            .buckets
            .iter()
            .map(|b| (b.category, b.count + rng.gen_range(0..=MAX_TICK_STEP)))
            .collect();
        HistogramState::from_counts(&counts)
    }

    pub fn buckets(&self) -> &[HistogramBucket] {
        &self.buckets
    }

    /// Sum of all bucket counts.
    pub fn total(&self) -> u64 {
        self.buckets.iter().map(|b| b.count).sum()
    }

    pub fn count(&self, category: Category) -> u64 {
        self.buckets
            .iter()
            .find(|b| b.category == category)
            .map(|b| b.count)
            .unwrap_or(0)
    }
}

impl Default for HistogramState {
    fn default() -> Self {
        let counts: HashMap<Category, u64> = SEED_COUNTS.iter().copied().collect();
        Self::from_counts(&counts)
    }
}
