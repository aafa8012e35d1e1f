//! Aggregation engine for usage-stats.
//!
//! Merges day observations into a date-keyed series, derives the statistics
//! bundle (period totals, velocity, highest records, streaks) and persists
//! both artifacts as JSON.

pub mod aggregator;
pub mod analysis;
pub mod merger;
pub mod store;
pub mod streaks;

pub use stats_core as core;
