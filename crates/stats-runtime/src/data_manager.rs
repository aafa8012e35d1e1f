//! Retrying fetch manager for the upload runtime.
//!
//! Wraps a [`UsageSource`] with a bounded number of attempts and a linear
//! back-off between them. Callers use [`FetchManager::fetch`] to obtain a
//! batch of observations; the manager records the last error and the time of
//! the last successful fetch for reporting.

use std::time::{Duration, Instant};

use stats_core::error::Result;
use stats_core::models::RawDayObservation;

use crate::source::UsageSource;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Upper bound on fetch attempts per run.
pub const MAX_FETCH_ATTEMPTS: u32 = 5;

/// Back-off step between attempts; attempt `n` waits `n * step`.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

// ── FetchManager ──────────────────────────────────────────────────────────────

/// Retry wrapper around a [`UsageSource`].
///
/// # Example
/// ```no_run
/// use std::time::Duration;
/// use stats_runtime::data_manager::FetchManager;
/// use stats_runtime::source::CommandSource;
///
/// # async fn demo() -> stats_core::Result<()> {
/// let source = CommandSource::new("npx ccusage --json", Duration::from_secs(120));
/// let mut mgr = FetchManager::new(source, 3);
/// let batch = mgr.fetch().await?;
/// println!("fetched {} records", batch.len());
/// # Ok(())
/// # }
/// ```
pub struct FetchManager<S> {
    source: S,
    /// Attempts per fetch, clamped to `1..=MAX_FETCH_ATTEMPTS`.
    max_attempts: u32,
    retry_delay: Duration,
    /// Human-readable description of the last error encountered.
    last_error: Option<String>,
    /// When the last *successful* fetch completed.
    last_successful_fetch: Option<Instant>,
}

impl<S: UsageSource> FetchManager<S> {
    /// Create a manager making up to `max_attempts` attempts per fetch.
    pub fn new(source: S, max_attempts: u32) -> Self {
        Self {
            source,
            max_attempts: max_attempts.clamp(1, MAX_FETCH_ATTEMPTS),
            retry_delay: DEFAULT_RETRY_DELAY,
            last_error: None,
            last_successful_fetch: None,
        }
    }

    /// Override the back-off step.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Fetch a batch, retrying failed attempts.
    ///
    /// Back-off schedule: attempt 1 → 0, attempt 2 → 1 step, attempt 3 →
    /// 2 steps, and so on. The error of the final attempt is returned when
    /// every attempt fails.
    pub async fn fetch(&mut self) -> Result<Vec<RawDayObservation>> {
        let mut attempt: u32 = 0;
        loop {
            if attempt > 0 {
                let sleep = self.retry_delay * attempt;
                tracing::debug!(
                    attempt,
                    sleep_ms = sleep.as_millis() as u64,
                    "retrying fetch after back-off"
                );
                tokio::time::sleep(sleep).await;
            }
            attempt += 1;

            match self.source.fetch().await {
                Ok(batch) => {
                    tracing::debug!(
                        source = %self.source.describe(),
                        attempt,
                        records = batch.len(),
                        "fetch succeeded"
                    );
                    self.last_successful_fetch = Some(Instant::now());
                    self.last_error = None;
                    return Ok(batch);
                }
                Err(e) => {
                    tracing::warn!(
                        source = %self.source.describe(),
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "fetch attempt failed"
                    );
                    self.last_error = Some(e.to_string());
                    if attempt >= self.max_attempts {
                        return Err(e);
                    }
                }
            }
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Human-readable description of the last fetch error, or `None`.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Time since the last successful fetch, or `None` if none succeeded.
    pub fn since_last_success(&self) -> Option<Duration> {
        self.last_successful_fetch.map(|ts| ts.elapsed())
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
