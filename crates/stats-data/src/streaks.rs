//! Consecutive-day streaks over a merged day series.

use chrono::NaiveDate;
use stats_core::models::{DayRecord, StreakInfo};
use stats_core::time_utils::previous_day;

/// Stateless streak calculator.
pub struct StreakCalculator;

impl StreakCalculator {
    /// Compute the longest run of consecutive dates and the live run.
    ///
    /// `series` must be ascending with unique dates. The trailing run counts
    /// as the current streak only while its last date is `today` or the day
    /// before; after that it is broken and the current streak is 0.
    pub fn calculate(series: &[DayRecord], today: NaiveDate) -> StreakInfo {
        let Some(last) = series.last() else {
            return StreakInfo::default();
        };

        let mut longest: u32 = 0;
        let mut run: u32 = 1;

        for pair in series.windows(2) {
            let gap = (pair[1].date - pair[0].date).num_days();
            if gap == 1 {
                run += 1;
            } else {
                longest = longest.max(run);
                run = 1;
            }
        }
        longest = longest.max(run);

        let is_live = last.date == today || last.date == previous_day(today);

        StreakInfo {
            current_streak: if is_live { run } else { 0 },
            longest_streak: longest,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
