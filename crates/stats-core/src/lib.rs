//! Shared building blocks for usage-stats.
//!
//! Holds the day-series data model, the crate-wide error type, CLI settings,
//! calendar/timezone helpers, date normalization and display formatting.

pub mod data_processors;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{Result, StatsError};
