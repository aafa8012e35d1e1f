//! Persistence of the day series and statistics bundle as JSON files.
//!
//! A data directory holds two artifacts:
//!
//! * `days.json`  – the merged day series (array of day records)
//! * `stats.json` – the latest statistics bundle
//!
//! Both are written pretty-printed and atomically (temp file, then rename).

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use stats_core::error::{Result, StatsError};
use stats_core::models::{DayRecord, DaySeries, RawDayObservation, StatsBundle};
use tracing::{debug, info, warn};

use crate::merger::SeriesMerger;

/// File name of the persisted day series.
pub const DAYS_FILE: &str = "days.json";
/// File name of the persisted statistics bundle.
pub const STATS_FILE: &str = "stats.json";

// ── SeriesStore ───────────────────────────────────────────────────────────────

/// Blob store holding the current series and the latest statistics.
pub trait SeriesStore {
    /// Read the stored series. A missing or unreadable series is empty.
    fn load_series(&self) -> DaySeries;

    /// Replace the stored series.
    fn save_series(&self, series: &[DayRecord]) -> Result<()>;

    /// Replace the stored statistics bundle.
    fn save_stats(&self, stats: &StatsBundle) -> Result<()>;
}

// ── JsonFileStore ─────────────────────────────────────────────────────────────

/// [`SeriesStore`] backed by `days.json` and `stats.json` in one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn days_path(&self) -> PathBuf {
        self.data_dir.join(DAYS_FILE)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.data_dir.join(STATS_FILE)
    }

    /// Read the last written statistics bundle.
    ///
    /// Returns `Ok(None)` when nothing has been written yet.
    pub fn load_stats(&self) -> Result<Option<StatsBundle>> {
        let path = self.stats_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|source| StatsError::FileRead { path, source })?;
        Ok(Some(serde_json::from_str(&content)?))
    }
}

impl SeriesStore for JsonFileStore {
    fn load_series(&self) -> DaySeries {
        let path = self.days_path();

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored day series, starting empty");
                return DaySeries::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read day series, starting empty");
                return DaySeries::new();
            }
        };

        if content.trim().is_empty() {
            return DaySeries::new();
        }

        let items = match serde_json::from_str::<Vec<Value>>(&content) {
            Ok(items) => items,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "day series is not a JSON array, starting empty");
                return DaySeries::new();
            }
        };

        let mut observations = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            if !item.is_object() {
                warn!(path = %path.display(), index, "skipping non-object entry in day series");
                continue;
            }
            match serde_json::from_value::<RawDayObservation>(item) {
                Ok(obs) => observations.push(obs),
                Err(e) => {
                    warn!(path = %path.display(), index, error = %e, "skipping unreadable entry in day series")
                }
            }
        }

        let series = SeriesMerger::normalize(&observations);
        debug!(
            path = %path.display(),
            records = observations.len(),
            days = series.len(),
            "loaded day series"
        );
        series
    }

    fn save_series(&self, series: &[DayRecord]) -> Result<()> {
        let path = self.days_path();
        write_json_atomic(&path, series)?;
        info!(path = %path.display(), days = series.len(), "saved day series");
        Ok(())
    }

    fn save_stats(&self, stats: &StatsBundle) -> Result<()> {
        let path = self.stats_path();
        write_json_atomic(&path, stats)?;
        info!(path = %path.display(), "saved statistics");
        Ok(())
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Serialise `value` as pretty JSON and move it into place at `path`.
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let write_err = |source: std::io::Error| StatsError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let json = serde_json::to_string_pretty(value)?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
