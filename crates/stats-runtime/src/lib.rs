//! Runtime layer for usage-stats.
//!
//! Runs the external usage source with bounded retries and drives one
//! upload cycle: fetch, merge, aggregate, persist.

pub mod data_manager;
pub mod orchestrator;
pub mod source;

pub use stats_core as core;
pub use stats_data as data;
