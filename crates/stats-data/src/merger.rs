//! Merge-by-date of a stored day series with a fresh batch of observations.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use stats_core::data_processors::DateNormalizer;
use stats_core::models::{DayRecord, DaySeries, RawDayObservation};
use tracing::{debug, warn};

/// Stateless helper that folds observations into a day series.
pub struct SeriesMerger;

impl SeriesMerger {
    /// Merge `incoming` observations into `existing`.
    ///
    /// The map is seeded with `existing`, then every incoming observation
    /// overwrites its date in iteration order, so the last incoming record for
    /// a date wins. Missing numeric fields become 0. Observations without a
    /// parseable date are skipped.
    ///
    /// The result is ascending by date with one record per date.
    pub fn merge(existing: &[DayRecord], incoming: &[RawDayObservation]) -> DaySeries {
        // BTreeMap keeps keys sorted; NaiveDate orders like its ISO string.
        let mut by_date: BTreeMap<NaiveDate, DayRecord> = existing
            .iter()
            .map(|record| (record.date, record.clone()))
            .collect();

        let mut skipped = 0usize;
        for observation in incoming {
            let Some(date) = observation
                .date
                .as_deref()
                .and_then(DateNormalizer::parse_str)
            else {
                warn!(
                    date = ?observation.date,
                    "skipping usage observation without a usable date"
                );
                skipped += 1;
                continue;
            };
            by_date.insert(date, observation.to_record(date));
        }

        debug!(
            existing = existing.len(),
            incoming = incoming.len(),
            skipped,
            merged = by_date.len(),
            "merged day series"
        );

        by_date.into_values().collect()
    }

    /// Re-normalize a series read back from storage.
    ///
    /// Equivalent to merging the observations into an empty series: dates are
    /// reduced to calendar days, duplicates collapse (last wins) and the
    /// result is sorted.
    pub fn normalize(observations: &[RawDayObservation]) -> DaySeries {
        Self::merge(&[], observations)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
