//! Statistics over a merged day series: period totals, velocity, highest
//! day/week/month and streaks.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate};
use chrono_tz::Tz;
use stats_core::models::{
    DayRecord, HighestDay, HighestPeriod, HighestRecords, PeriodStats, StatsBundle, VelocityStats,
};
use stats_core::time_utils::{
    format_timestamp, iso_week_key, month_key, month_start, week_start, year_start,
};
use tracing::debug;

use crate::streaks::StreakCalculator;

/// Number of trailing records averaged into the daily velocity.
pub const VELOCITY_WINDOW: usize = 7;

// ── PeriodBucket ──────────────────────────────────────────────────────────────

/// Summed cost and tokens for one week or month bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodBucket {
    /// The bucket key, e.g. `"2025-W1"` (ISO week) or `"2024-03"` (month).
    pub period_key: String,
    pub total_cost: f64,
    pub total_tokens: u64,
}

impl PeriodBucket {
    fn new(period_key: String) -> Self {
        Self {
            period_key,
            total_cost: 0.0,
            total_tokens: 0,
        }
    }

    fn add_record(&mut self, record: &DayRecord) {
        self.total_cost += record.total_cost;
        self.total_tokens = self.total_tokens.saturating_add(record.total_tokens);
    }
}

// ── UsageAggregator ───────────────────────────────────────────────────────────

/// Stateless helper that derives a [`StatsBundle`] from a day series.
pub struct UsageAggregator;

impl UsageAggregator {
    /// Compute the full statistics bundle for `series` as of `now`.
    ///
    /// `series` must be ascending with unique dates (a Merger output). Period
    /// windows and streak liveness use `now`'s calendar date in its own
    /// timezone.
    pub fn aggregate(series: &[DayRecord], now: &DateTime<Tz>) -> StatsBundle {
        let today = now.date_naive();

        let bundle = StatsBundle {
            lifetime: Self::period_stats(series),
            yearly: Self::period_stats(Self::since(series, year_start(today))),
            monthly: Self::period_stats(Self::since(series, month_start(today))),
            weekly: Self::period_stats(Self::since(series, week_start(today))),
            daily: Self::velocity(series),
            highest: HighestRecords {
                day: Self::highest_day(series),
                week: Self::highest_period(&Self::aggregate_weekly(series)),
                month: Self::highest_period(&Self::aggregate_monthly(series)),
            },
            streaks: StreakCalculator::calculate(series, today),
            last_updated: format_timestamp(now),
        };

        debug!(
            days = series.len(),
            today = %today,
            lifetime_cost = bundle.lifetime.total_cost,
            current_streak = bundle.streaks.current_streak,
            "aggregated usage statistics"
        );
        bundle
    }

    /// Sums and per-day averages over `records`.
    pub fn period_stats<'a>(records: impl IntoIterator<Item = &'a DayRecord>) -> PeriodStats {
        let mut stats = PeriodStats::default();
        for record in records {
            stats.total_cost += record.total_cost;
            stats.total_tokens = stats.total_tokens.saturating_add(record.total_tokens);
            stats.day_count += 1;
        }
        if stats.day_count > 0 {
            let n = stats.day_count as f64;
            stats.average_cost = stats.total_cost / n;
            stats.average_tokens = stats.total_tokens as f64 / n;
        }
        stats
    }

    /// Means over the last [`VELOCITY_WINDOW`] records (fewer if the series
    /// is shorter). The window counts records, not calendar days.
    pub fn velocity(series: &[DayRecord]) -> VelocityStats {
        let window = &series[series.len().saturating_sub(VELOCITY_WINDOW)..];
        if window.is_empty() {
            return VelocityStats::default();
        }
        let n = window.len() as f64;
        let cost: f64 = window.iter().map(|r| r.total_cost).sum();
        let tokens: f64 = window.iter().map(|r| r.total_tokens as f64).sum();
        VelocityStats {
            total_cost: cost / n,
            total_tokens: tokens / n,
        }
    }

    /// The record with the greatest cost. Ties keep the earliest date; a
    /// series with no positive cost yields a zero record with no date.
    pub fn highest_day(series: &[DayRecord]) -> HighestDay {
        let mut best = HighestDay::default();
        for record in series {
            if record.total_cost > best.total_cost {
                best = HighestDay {
                    total_cost: record.total_cost,
                    total_tokens: record.total_tokens,
                    date: Some(record.date),
                };
            }
        }
        best
    }

    /// Group `series` by ISO week, oldest bucket first.
    pub fn aggregate_weekly(series: &[DayRecord]) -> Vec<PeriodBucket> {
        Self::aggregate_by_period(
            series,
            |d| {
                let week = d.iso_week();
                (week.year(), week.week())
            },
            iso_week_key,
        )
    }

    /// Group `series` by calendar month, oldest bucket first.
    pub fn aggregate_monthly(series: &[DayRecord]) -> Vec<PeriodBucket> {
        Self::aggregate_by_period(series, |d| (d.year(), d.month()), month_key)
    }

    /// The bucket with the greatest summed cost.
    ///
    /// Buckets are compared in the given order with a strictly-greater test
    /// against a running best that starts at 0.
    pub fn highest_period(buckets: &[PeriodBucket]) -> HighestPeriod {
        let mut best = HighestPeriod::default();
        for bucket in buckets {
            if bucket.total_cost > best.total_cost {
                best = HighestPeriod {
                    total_cost: bucket.total_cost,
                    total_tokens: bucket.total_tokens,
                    period: Some(bucket.period_key.clone()),
                };
            }
        }
        best
    }

    // ── Private ───────────────────────────────────────────────────────────────

    /// Records dated on or after `start`.
    fn since(series: &[DayRecord], start: NaiveDate) -> impl Iterator<Item = &DayRecord> {
        series.iter().filter(move |r| r.date >= start)
    }

    /// Generic bucketing driver.
    ///
    /// `order_key` sorts buckets chronologically; `label` renders the
    /// persisted key. Week labels like `2025-W10` do not sort as strings.
    fn aggregate_by_period<K: Ord>(
        series: &[DayRecord],
        order_key: impl Fn(NaiveDate) -> K,
        label: impl Fn(NaiveDate) -> String,
    ) -> Vec<PeriodBucket> {
        let mut map: BTreeMap<K, PeriodBucket> = BTreeMap::new();
        for record in series {
            map.entry(order_key(record.date))
                .or_insert_with(|| PeriodBucket::new(label(record.date)))
                .add_record(record);
        }
        map.into_values().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
