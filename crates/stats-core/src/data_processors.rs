use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

// ── DateNormalizer ────────────────────────────────────────────────────────────

/// Reduces the date strings found in usage records to a calendar-date key.
pub struct DateNormalizer;

impl DateNormalizer {
    /// Parse a date or date-time string and strip the time of day.
    ///
    /// Handles:
    /// * `YYYY-MM-DD`
    /// * RFC 3339 / ISO 8601 with offset or `Z`; the date is taken as written,
    ///   in the timestamp's own offset.
    /// * naive date-times with `T` or space separators, optional fractions.
    pub fn parse_str(s: &str) -> Option<NaiveDate> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Some(date);
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.date_naive());
        }

        const FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%dT%H:%M",
        ];

        for fmt in FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Some(naive.date());
            }
        }

        debug!(input = s, "unrecognised date string");
        None
    }

    /// Canonical ISO calendar-date key (`YYYY-MM-DD`).
    pub fn key(date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
