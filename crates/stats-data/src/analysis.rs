//! Processing pipeline for one batch of usage.
//!
//! Folds a fresh batch of observations into the stored series and derives
//! the statistics bundle, returning both artifacts ready to persist.

use chrono::DateTime;
use chrono_tz::Tz;
use stats_core::models::{DayRecord, DaySeries, RawDayObservation, StatsBundle};
use tracing::debug;

use crate::aggregator::UsageAggregator;
use crate::merger::SeriesMerger;

// ── Public types ──────────────────────────────────────────────────────────────

/// The complete output of [`process_usage`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedUsage {
    /// Merged series, ascending by date with unique dates.
    pub days: DaySeries,
    /// Statistics derived from `days` at the processing instant.
    pub stats: StatsBundle,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full processing pipeline.
///
/// 1. Merge `incoming` into `existing` (last write wins per date).
/// 2. Aggregate the merged series as of `now`.
///
/// Pure: the same inputs always give the same output.
pub fn process_usage(
    existing: &[DayRecord],
    incoming: &[RawDayObservation],
    now: &DateTime<Tz>,
) -> ProcessedUsage {
    let days = SeriesMerger::merge(existing, incoming);
    let stats = UsageAggregator::aggregate(&days, now);

    debug!(
        prior = existing.len(),
        incoming = incoming.len(),
        merged = days.len(),
        "processed usage batch"
    );

    ProcessedUsage { days, stats }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
