//! Upload orchestrator.
//!
//! One short-lived batch run: fetch fresh observations through the
//! [`FetchManager`], load the stored series, merge and aggregate, then write
//! the statistics and the series back to the store.

use chrono::DateTime;
use chrono_tz::Tz;
use stats_core::error::Result;
use stats_core::models::{DaySeries, StatsBundle};
use stats_data::analysis::process_usage;
use stats_data::store::SeriesStore;

use crate::data_manager::FetchManager;
use crate::source::UsageSource;

// ── Public types ──────────────────────────────────────────────────────────────

/// Outcome of one [`UploadOrchestrator::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Days in the stored series before this run.
    pub prior_days: usize,
    /// Observations received from the source.
    pub incoming_records: usize,
    /// Days in the series after merging.
    pub merged_days: usize,
    /// The statistics bundle that was written.
    pub stats: StatsBundle,
    /// The series that was written.
    pub days: DaySeries,
}

impl RunSummary {
    /// Dates present after the merge that were not stored before.
    pub fn new_days(&self) -> usize {
        self.merged_days.saturating_sub(self.prior_days)
    }
}

// ── UploadOrchestrator ────────────────────────────────────────────────────────

/// Single-writer batch job tying a usage source to a series store.
pub struct UploadOrchestrator<S, P> {
    fetcher: FetchManager<S>,
    store: P,
}

impl<S: UsageSource, P: SeriesStore> UploadOrchestrator<S, P> {
    pub fn new(fetcher: FetchManager<S>, store: P) -> Self {
        Self { fetcher, store }
    }

    /// Run one fetch → merge → aggregate → persist cycle as of `now`.
    ///
    /// A failed fetch returns before the store is read or written. Statistics
    /// are written before the series.
    pub async fn run(&mut self, now: &DateTime<Tz>) -> Result<RunSummary> {
        tracing::info!(source = %self.fetcher.source().describe(), "fetching usage data");
        let incoming = self.fetcher.fetch().await?;

        let existing = self.store.load_series();
        tracing::debug!(
            prior = existing.len(),
            incoming = incoming.len(),
            "loaded stored series"
        );

        let processed = process_usage(&existing, &incoming, now);

        self.store.save_stats(&processed.stats)?;
        self.store.save_series(&processed.days)?;

        let summary = RunSummary {
            prior_days: existing.len(),
            incoming_records: incoming.len(),
            merged_days: processed.days.len(),
            stats: processed.stats,
            days: processed.days,
        };

        tracing::info!(
            prior = summary.prior_days,
            incoming = summary.incoming_records,
            merged = summary.merged_days,
            new_days = summary.new_days(),
            "usage data processed"
        );
        Ok(summary)
    }

    pub fn fetcher(&self) -> &FetchManager<S> {
        &self.fetcher
    }

    pub fn store(&self) -> &P {
        &self.store
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
