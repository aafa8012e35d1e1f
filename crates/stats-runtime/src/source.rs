//! Usage sources: where fresh day observations come from.
//!
//! The production source runs an external command (by default
//! `npx ccusage --json`) and reads a JSON document from its stdout.

use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use stats_core::error::{Result, StatsError};
use stats_core::models::RawDayObservation;
use tracing::{debug, warn};

// ── UsageSource ───────────────────────────────────────────────────────────────

/// A producer of raw day observations, in arbitrary order.
#[allow(async_fn_in_trait)]
pub trait UsageSource {
    /// Fetch the current batch of observations.
    async fn fetch(&self) -> Result<Vec<RawDayObservation>>;

    /// Short description used in log lines.
    fn describe(&self) -> String;
}

// ── CommandSource ─────────────────────────────────────────────────────────────

/// Runs a command line and parses its stdout as a usage payload.
///
/// The command is split on whitespace into a program and its arguments; no
/// shell is involved, so quoting and pipes are not interpreted.
#[derive(Debug, Clone)]
pub struct CommandSource {
    command: String,
    timeout: Duration,
}

impl CommandSource {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl UsageSource for CommandSource {
    async fn fetch(&self) -> Result<Vec<RawDayObservation>> {
        let mut parts = self.command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| StatsError::Config("usage source command is empty".to_string()))?;

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(command = %self.command, timeout = ?self.timeout, "running usage source");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Err(_) => {
                return Err(StatsError::SourceTimeout {
                    command: self.command.clone(),
                    timeout: self.timeout,
                })
            }
            Ok(Err(source)) => {
                return Err(StatsError::SourceSpawn {
                    command: self.command.clone(),
                    source,
                })
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            return Err(StatsError::SourceFailed {
                command: self.command.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let observations = parse_usage_payload(&stdout)?;
        debug!(
            command = %self.command,
            records = observations.len(),
            bytes = output.stdout.len(),
            "usage source returned"
        );
        Ok(observations)
    }

    fn describe(&self) -> String {
        self.command.clone()
    }
}

// ── Payload parsing ───────────────────────────────────────────────────────────

/// Extract day observations from a usage JSON document.
///
/// Records are taken from the `daily` array, else from `usage.days`, else the
/// batch is empty. Array items that are not JSON objects are skipped.
///
/// Fails with [`StatsError::SourceParse`] when `text` is not JSON at all.
pub fn parse_usage_payload(text: &str) -> Result<Vec<RawDayObservation>> {
    let payload: Value =
        serde_json::from_str(text.trim()).map_err(|e| StatsError::SourceParse(e.to_string()))?;

    let records = payload
        .get("daily")
        .and_then(Value::as_array)
        .or_else(|| payload.pointer("/usage/days").and_then(Value::as_array));

    let Some(records) = records else {
        debug!("usage payload has no daily records");
        return Ok(Vec::new());
    };

    let observations = records
        .iter()
        .filter_map(|item| {
            if !item.is_object() {
                warn!(item = %item, "skipping non-object usage record");
                return None;
            }
            match serde_json::from_value::<RawDayObservation>(item.clone()) {
                Ok(observation) => Some(observation),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable usage record");
                    None
                }
            }
        })
        .collect();

    Ok(observations)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_usage_payload ──────────────────────────────────────────────────

    #[test]
    fn test_parse_daily_array() {
        let text = r#"{
            "daily": [
                {"date": "2024-01-01", "totalCost": 1.5, "totalTokens": 100,
                 "inputTokens": 10, "outputTokens": 20, "cacheCreationTokens": 30},
                {"date": "2024-01-02", "totalCost": 2}
            ],
            "totals": {"totalCost": 3.5}
        }"#;
        let records = parse_usage_payload(text).expect("parse");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date.as_deref(), Some("2024-01-01"));
        assert_eq!(records[0].total_cost, Some(1.5));
        assert_eq!(records[0].resolved_cache_tokens(), 30);
        assert_eq!(records[1].total_cost, Some(2.0));
    }

    #[test]
    fn test_parse_falls_back_to_usage_days() {
        let text = r#"{"usage": {"days": [{"date": "2024-02-01", "totalCost": 4}]}}"#;
        let records = parse_usage_payload(text).expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date.as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn test_parse_prefers_daily_over_usage_days() {
        let text = r#"{
            "daily": [{"date": "2024-01-01"}],
            "usage": {"days": [{"date": "2023-01-01"}, {"date": "2023-01-02"}]}
        }"#;
        let records = parse_usage_payload(text).expect("parse");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_parse_without_records_is_empty() {
        assert!(parse_usage_payload(r#"{"totals": {}}"#).unwrap().is_empty());
        assert!(parse_usage_payload("[]").unwrap().is_empty());
        assert!(parse_usage_payload(r#"{"daily": "nope"}"#).unwrap().is_empty());
    }

    #[test]
    fn test_parse_skips_non_object_items() {
        let text = r#"{"daily": [1, null, {"date": "2024-01-01"}, "x"]}"#;
        let records = parse_usage_payload(text).expect("parse");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_parse_invalid_json_is_source_parse_error() {
        let err = parse_usage_payload("npm WARN something").unwrap_err();
        assert!(matches!(err, StatsError::SourceParse(_)));
    }

    // ── CommandSource ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_empty_command_is_config_error() {
        let source = CommandSource::new("   ", Duration::from_secs(1));
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, StatsError::Config(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_stdout_is_parsed() {
        let source = CommandSource::new(
            r#"echo {"daily":[{"date":"2024-01-01","totalCost":1.25}]}"#,
            Duration::from_secs(10),
        );
        let records = source.fetch().await.expect("fetch");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].total_cost, Some(1.25));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_non_json_output_is_parse_error() {
        let source = CommandSource::new("echo hello", Duration::from_secs(10));
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, StatsError::SourceParse(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_failure_is_source_failed() {
        let source = CommandSource::new("false", Duration::from_secs(10));
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, StatsError::SourceFailed { .. }));
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let source = CommandSource::new(
            "usage-stats-no-such-program-xyz --json",
            Duration::from_secs(10),
        );
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, StatsError::SourceSpawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_slow_command_times_out() {
        let source = CommandSource::new("sleep 5", Duration::from_millis(100));
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, StatsError::SourceTimeout { .. }));
    }

    #[test]
    fn test_describe_is_command_line() {
        let source = CommandSource::new("npx ccusage --json", Duration::from_secs(1));
        assert_eq!(source.describe(), "npx ccusage --json");
        assert_eq!(source.command(), "npx ccusage --json");
        assert_eq!(source.timeout(), Duration::from_secs(1));
    }
}
