use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

/// One calendar day of usage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    /// Calendar date; the identity key within a series.
    pub date: NaiveDate,
    /// Cost in currency units.
    #[serde(default)]
    pub total_cost: f64,
    /// All tokens consumed on this day.
    #[serde(default)]
    pub total_tokens: u64,
    /// Input (prompt) tokens.
    #[serde(default)]
    pub input_tokens: u64,
    /// Output (completion) tokens.
    #[serde(default)]
    pub output_tokens: u64,
    /// Tokens written into the prompt cache.
    #[serde(default)]
    pub cache_tokens: u64,
}

impl DayRecord {
    /// A record carrying only a date and a cost, every token count zero.
    pub fn new(date: NaiveDate, total_cost: f64) -> Self {
        Self {
            date,
            total_cost,
            total_tokens: 0,
            input_tokens: 0,
            output_tokens: 0,
            cache_tokens: 0,
        }
    }
}

/// Ordered day records: ascending by date, unique dates.
pub type DaySeries = Vec<DayRecord>;

/// A day record exactly as the usage source (or an older `days.json`) reports it.
///
/// Every field is optional and lenient: a key that is absent, `null`, or of
/// the wrong JSON type decodes as `None` instead of failing the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDayObservation {
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_cost: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub input_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub output_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub cache_creation_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub cache_tokens: Option<u64>,
}

impl RawDayObservation {
    /// Observation with a date and cost only.
    pub fn new(date: impl Into<String>, total_cost: f64) -> Self {
        Self {
            date: Some(date.into()),
            total_cost: Some(total_cost),
            ..Default::default()
        }
    }

    /// Cache tokens for this day.
    ///
    /// `cacheCreationTokens` wins when it is present and non-zero, otherwise
    /// `cacheTokens` is used, otherwise 0.
    pub fn resolved_cache_tokens(&self) -> u64 {
        match self.cache_creation_tokens {
            Some(n) if n > 0 => n,
            _ => self.cache_tokens.unwrap_or(0),
        }
    }

    /// Build a [`DayRecord`] for `date`, defaulting every missing number to 0.
    pub fn to_record(&self, date: NaiveDate) -> DayRecord {
        DayRecord {
            date,
            total_cost: self.total_cost.unwrap_or(0.0),
            total_tokens: self.total_tokens.unwrap_or(0),
            input_tokens: self.input_tokens.unwrap_or(0),
            output_tokens: self.output_tokens.unwrap_or(0),
            cache_tokens: self.resolved_cache_tokens(),
        }
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.and_then(|v| v.as_str().map(str::to_string)))
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.and_then(|v| v.as_f64()))
}

fn lenient_u64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    Ok(Option::<Value>::deserialize(d)?.and_then(|v| token_count(&v)))
}

/// Token counts are unsigned: negative numbers read as missing and fractional
/// ones are truncated.
fn token_count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    let f = value.as_f64()?;
    if f < 0.0 {
        debug!(value = f, "negative token count read as missing");
        return None;
    }
    if f.fract() != 0.0 {
        debug!(value = f, "fractional token count truncated");
    }
    Some(f as u64)
}

/// Sums and per-day averages over a subset of the series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStats {
    pub total_cost: f64,
    pub total_tokens: u64,
    /// `total_cost / day_count`, or 0 for an empty period.
    pub average_cost: f64,
    /// `total_tokens / day_count`, or 0 for an empty period.
    pub average_tokens: f64,
    pub day_count: usize,
}

/// Trailing-window means (the "daily velocity").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VelocityStats {
    pub total_cost: f64,
    pub total_tokens: f64,
}

/// The single most expensive day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighestDay {
    pub total_cost: f64,
    pub total_tokens: u64,
    /// `None` when the series is empty or no day has a positive cost.
    pub date: Option<NaiveDate>,
}

/// The most expensive week or month bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighestPeriod {
    pub total_cost: f64,
    pub total_tokens: u64,
    /// Bucket key, e.g. `"2025-W1"` or `"2024-03"`.
    #[serde(default)]
    pub period: Option<String>,
}

/// Highest day, week and month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HighestRecords {
    pub day: HighestDay,
    pub week: HighestPeriod,
    pub month: HighestPeriod,
}

/// Consecutive-day activity runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakInfo {
    /// Length of the trailing run, or 0 when it ended before yesterday.
    pub current_streak: u32,
    /// Longest run anywhere in the series.
    pub longest_streak: u32,
}

/// Everything the aggregator derives from a series in one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsBundle {
    pub lifetime: PeriodStats,
    pub yearly: PeriodStats,
    pub monthly: PeriodStats,
    pub weekly: PeriodStats,
    pub daily: VelocityStats,
    pub highest: HighestRecords,
    pub streaks: StreakInfo,
    /// RFC 3339 UTC timestamp of the aggregation instant.
    pub last_updated: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ── DayRecord ──────────────────────────────────────────────────────────

    #[test]
    fn test_day_record_serializes_camel_case() {
        let record = DayRecord {
            date: date(2024, 1, 2),
            total_cost: 1.5,
            total_tokens: 300,
            input_tokens: 100,
            output_tokens: 150,
            cache_tokens: 50,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2024-01-02");
        assert_eq!(json["totalCost"], 1.5);
        assert_eq!(json["totalTokens"], 300);
        assert_eq!(json["inputTokens"], 100);
        assert_eq!(json["outputTokens"], 150);
        assert_eq!(json["cacheTokens"], 50);
    }

    #[test]
    fn test_day_record_missing_token_fields_default_to_zero() {
        let record: DayRecord =
            serde_json::from_str(r#"{"date":"2024-01-02","totalCost":2.0}"#).unwrap();
        assert_eq!(record.total_tokens, 0);
        assert_eq!(record.input_tokens, 0);
        assert_eq!(record.cache_tokens, 0);
    }

    // ── RawDayObservation ──────────────────────────────────────────────────

    #[test]
    fn test_raw_observation_reads_ccusage_shape() {
        let raw: RawDayObservation = serde_json::from_str(
            r#"{
                "date": "2024-03-05",
                "inputTokens": 10,
                "outputTokens": 20,
                "cacheCreationTokens": 30,
                "cacheReadTokens": 40,
                "totalTokens": 100,
                "totalCost": 0.75,
                "modelsUsed": ["claude-sonnet-4"]
            }"#,
        )
        .unwrap();
        assert_eq!(raw.date.as_deref(), Some("2024-03-05"));
        assert_eq!(raw.total_cost, Some(0.75));
        assert_eq!(raw.total_tokens, Some(100));
        assert_eq!(raw.resolved_cache_tokens(), 30);
    }

    #[test]
    fn test_raw_observation_wrong_types_become_none() {
        let raw: RawDayObservation = serde_json::from_str(
            r#"{"date": 20240305, "totalCost": "a lot", "totalTokens": null, "inputTokens": -4}"#,
        )
        .unwrap();
        assert!(raw.date.is_none());
        assert!(raw.total_cost.is_none());
        assert!(raw.total_tokens.is_none());
        assert!(raw.input_tokens.is_none());
    }

    #[test]
    fn test_raw_observation_whole_float_tokens_accepted() {
        let raw: RawDayObservation =
            serde_json::from_str(r#"{"date":"2024-01-01","totalTokens":12.0}"#).unwrap();
        assert_eq!(raw.total_tokens, Some(12));
    }

    #[test]
    fn test_token_count_negative_and_fractional() {
        assert_eq!(token_count(&json!(-5)), None);
        assert_eq!(token_count(&json!(-0.5)), None);
        assert_eq!(token_count(&json!(12.7)), Some(12));
        assert_eq!(token_count(&json!(40)), Some(40));
        assert_eq!(token_count(&json!("40")), None);
    }

    #[test]
    fn test_cache_tokens_prefers_creation_field() {
        let raw = RawDayObservation {
            cache_creation_tokens: Some(7),
            cache_tokens: Some(9),
            ..Default::default()
        };
        assert_eq!(raw.resolved_cache_tokens(), 7);
    }

    #[test]
    fn test_cache_tokens_zero_creation_falls_back() {
        let raw = RawDayObservation {
            cache_creation_tokens: Some(0),
            cache_tokens: Some(9),
            ..Default::default()
        };
        assert_eq!(raw.resolved_cache_tokens(), 9);
    }

    #[test]
    fn test_cache_tokens_absent_is_zero() {
        assert_eq!(RawDayObservation::default().resolved_cache_tokens(), 0);
    }

    #[test]
    fn test_to_record_defaults_missing_fields() {
        let raw = RawDayObservation::new("2024-01-01", 3.0);
        let record = raw.to_record(date(2024, 1, 1));
        assert_eq!(record, DayRecord::new(date(2024, 1, 1), 3.0));
    }

    // ── StatsBundle ────────────────────────────────────────────────────────

    #[test]
    fn test_stats_bundle_field_names() {
        let json = serde_json::to_value(StatsBundle::default()).unwrap();
        for key in [
            "lifetime",
            "yearly",
            "monthly",
            "weekly",
            "daily",
            "highest",
            "streaks",
            "lastUpdated",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert!(json["lifetime"].get("averageCost").is_some());
        assert!(json["lifetime"].get("dayCount").is_some());
        assert!(json["highest"]["day"]["date"].is_null());
        assert!(json["highest"]["week"]["period"].is_null());
        assert_eq!(json["streaks"]["currentStreak"], 0);
        assert_eq!(json["streaks"]["longestStreak"], 0);
    }

    #[test]
    fn test_stats_bundle_deserializes_back() {
        let mut bundle = StatsBundle::default();
        bundle.lifetime.total_cost = 9.0;
        bundle.highest.day.date = Some(date(2024, 1, 2));
        bundle.last_updated = "2024-01-03T12:00:00.000Z".to_string();
        let json = serde_json::to_string(&bundle).unwrap();
        let back: StatsBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bundle);
    }
}
