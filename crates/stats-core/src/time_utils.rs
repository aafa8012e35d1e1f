use chrono::{DateTime, Datelike, Days, NaiveDate, SecondsFormat, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

// ── System timezone detection ─────────────────────────────────────────────────

/// Detect the IANA timezone name of the running system.
///
/// Uses the `iana-time-zone` crate directly – no subprocess calls.
/// Falls back to `"UTC"` if detection fails.
pub fn get_system_timezone() -> String {
    iana_time_zone::get_timezone().unwrap_or_else(|_| "UTC".to_string())
}

// ── TimezoneHandler ───────────────────────────────────────────────────────────

/// Anchors instants to the calendar of one configured timezone.
///
/// Every "day" in the statistics is midnight-to-midnight in this zone.
pub struct TimezoneHandler {
    default_tz: Tz,
}

impl TimezoneHandler {
    /// Create a handler for the given IANA timezone name.
    ///
    /// `"auto"` resolves to the system timezone. An unrecognised name falls
    /// back to UTC and logs a warning.
    pub fn new(tz_name: &str) -> Self {
        let name = if tz_name.eq_ignore_ascii_case("auto") {
            get_system_timezone()
        } else {
            tz_name.to_string()
        };
        let tz = name.parse::<Tz>().unwrap_or_else(|_| {
            warn!(
                "TimezoneHandler: unrecognised timezone \"{}\", falling back to UTC",
                name
            );
            Tz::UTC
        });
        Self { default_tz: tz }
    }

    /// Attach the configured timezone to a UTC instant.
    pub fn localize(&self, dt: DateTime<Utc>) -> DateTime<Tz> {
        dt.with_timezone(&self.default_tz)
    }

    /// The current instant in the configured timezone.
    ///
    /// The only place the system clock is read; everything downstream takes
    /// the returned instant as a parameter.
    pub fn now(&self) -> DateTime<Tz> {
        self.localize(Utc::now())
    }

    /// Expose the configured timezone.
    pub fn default_tz(&self) -> Tz {
        self.default_tz
    }
}

// ── Calendar arithmetic ───────────────────────────────────────────────────────

/// Most recent Sunday on or before `today`.
pub fn week_start(today: NaiveDate) -> NaiveDate {
    let back = u64::from(today.weekday().num_days_from_sunday());
    today.checked_sub_days(Days::new(back)).unwrap_or(today)
}

/// First day of `today`'s month.
pub fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

/// January 1 of `today`'s year.
pub fn year_start(today: NaiveDate) -> NaiveDate {
    today.with_ordinal(1).unwrap_or(today)
}

/// The day before `date`.
pub fn previous_day(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

/// ISO-8601 week bucket key, `{isoYear}-W{week}` (week not zero-padded).
///
/// The ISO year is the year of the Thursday in `date`'s Monday-based week,
/// so late-December days can belong to week 1 of the following year.
pub fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{}", week.year(), week.week())
}

/// Calendar month bucket key, `{year}-{month:02}`.
pub fn month_key(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

/// Serialise an instant as an RFC 3339 UTC timestamp with milliseconds and a
/// `Z` suffix, e.g. `2024-01-03T12:00:00.000Z`.
pub fn format_timestamp<T: TimeZone>(dt: &DateTime<T>) -> String {
    dt.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
