//! Plain-text terminal report over the stored statistics and day series.

use std::fmt::Write as _;

use chrono::{DateTime, TimeZone, Utc};
use stats_core::formatting::{
    format_currency, format_date, format_number, format_relative_time, format_tokens,
};
use stats_core::models::{DayRecord, HighestPeriod, PeriodStats, StatsBundle};
use stats_runtime::orchestrator::RunSummary;

// ── Summary ───────────────────────────────────────────────────────────────────

/// Render the statistics bundle as an aligned block of labelled lines.
///
/// `now` only feeds the relative "Last updated" line.
pub fn render_summary<T: TimeZone>(stats: &StatsBundle, now: &DateTime<T>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Usage summary");
    line(&mut out, "Total cost", format_currency(stats.lifetime.total_cost));
    line(&mut out, "Total tokens", format_tokens(stats.lifetime.total_tokens));
    line(&mut out, "Days active", stats.lifetime.day_count.to_string());
    line(&mut out, "Current streak", days(u64::from(stats.streaks.current_streak)));
    line(&mut out, "Longest streak", days(u64::from(stats.streaks.longest_streak)));
    line(
        &mut out,
        "Daily velocity",
        format!(
            "{} / {} tokens (last 7 active days)",
            format_currency(stats.daily.total_cost),
            format_number(stats.daily.total_tokens, 0)
        ),
    );
    line(&mut out, "This week", period(&stats.weekly));
    line(&mut out, "This month", period(&stats.monthly));
    line(&mut out, "This year", period(&stats.yearly));
    line(
        &mut out,
        "Average per day",
        format!(
            "{} / {} tokens",
            format_currency(stats.lifetime.average_cost),
            format_number(stats.lifetime.average_tokens, 0)
        ),
    );

    let highest_day = match stats.highest.day.date {
        Some(date) => format!(
            "{} on {}",
            format_currency(stats.highest.day.total_cost),
            format_date(date)
        ),
        None => "none".to_string(),
    };
    line(&mut out, "Highest day", highest_day);
    line(&mut out, "Highest week", highest(&stats.highest.week));
    line(&mut out, "Highest month", highest(&stats.highest.month));
    line(&mut out, "Last updated", last_updated(&stats.last_updated, now));
    out
}

/// One-line account of an upload run.
pub fn render_run(summary: &RunSummary) -> String {
    format!(
        "Processed {} records: {} days stored ({} new)",
        summary.incoming_records,
        summary.merged_days,
        summary.new_days()
    )
}

// ── Activity list ─────────────────────────────────────────────────────────────

/// One page of the activity list, most recent day first.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityPage {
    pub rows: Vec<DayRecord>,
    /// 1-based page index after clamping.
    pub page: usize,
    pub total_pages: usize,
    pub total_days: usize,
}

impl ActivityPage {
    /// Slice `days` (ascending) into the requested page.
    ///
    /// `page` is clamped to `1..=total_pages`; a page size of 0 counts as 1.
    pub fn new(days: &[DayRecord], page: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = days.len().div_ceil(page_size).max(1);
        let page = page.clamp(1, total_pages);

        let rows = days
            .iter()
            .rev()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect();

        Self {
            rows,
            page,
            total_pages,
            total_days: days.len(),
        }
    }
}

/// Render an [`ActivityPage`] as a list of day lines.
pub fn render_activity(page: &ActivityPage) -> String {
    if page.total_days == 0 {
        return "No activity recorded yet.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Recent activity (page {} of {}, {} days)",
        page.page, page.total_pages, page.total_days
    );
    for record in &page.rows {
        let _ = write!(
            out,
            "  {:<13} {:>12}  {:>14} tokens",
            format_date(record.date),
            format_currency(record.total_cost),
            format_tokens(record.total_tokens)
        );
        if record.input_tokens > 0 {
            let _ = write!(out, "  in {}", format_tokens(record.input_tokens));
        }
        if record.output_tokens > 0 {
            let _ = write!(out, "  out {}", format_tokens(record.output_tokens));
        }
        out.push('\n');
    }
    out
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn line(out: &mut String, label: &str, value: String) {
    let _ = writeln!(out, "  {:<16} {}", format!("{label}:"), value);
}

fn days(n: u64) -> String {
    format!("{} day{}", n, if n == 1 { "" } else { "s" })
}

fn period(stats: &PeriodStats) -> String {
    format!(
        "{} / {} tokens ({})",
        format_currency(stats.total_cost),
        format_tokens(stats.total_tokens),
        days(stats.day_count as u64)
    )
}

fn highest(record: &HighestPeriod) -> String {
    match &record.period {
        Some(key) => format!("{} ({})", format_currency(record.total_cost), key),
        None => "none".to_string(),
    }
}

fn last_updated<T: TimeZone>(raw: &str, now: &DateTime<T>) -> String {
    if raw.is_empty() {
        return "never".to_string();
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(then) => format_relative_time(then.with_timezone(&Utc), now),
        Err(_) => raw.to_string(),
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// `n` consecutive days starting 2024-01-01 with cost = day number.
    fn series(n: u64) -> Vec<DayRecord> {
        (0..n)
            .map(|i| DayRecord::new(date(2024, 1, 1) + Days::new(i), (i + 1) as f64))
            .collect()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 3, 12, 5, 0).unwrap()
    }

    // ── render_summary ───────────────────────────────────────────────────────

    #[test]
    fn test_render_summary_populated() {
        let mut stats = StatsBundle::default();
        stats.lifetime.total_cost = 1234.5;
        stats.lifetime.total_tokens = 2_500_000;
        stats.lifetime.day_count = 3;
        stats.streaks.current_streak = 1;
        stats.streaks.longest_streak = 3;
        stats.highest.day.total_cost = 900.0;
        stats.highest.day.date = Some(date(2024, 1, 2));
        stats.highest.week.total_cost = 1234.5;
        stats.highest.week.period = Some("2024-W1".to_string());
        stats.last_updated = "2024-01-03T12:00:00.000Z".to_string();

        let text = render_summary(&stats, &now());

        assert!(text.contains("Total cost:      $1,234.50"));
        assert!(text.contains("Total tokens:    2,500,000"));
        assert!(text.contains("Days active:     3"));
        assert!(text.contains("Current streak:  1 day\n"));
        assert!(text.contains("Longest streak:  3 days"));
        assert!(text.contains("Highest day:     $900.00 on Jan 2, 2024"));
        assert!(text.contains("Highest week:    $1,234.50 (2024-W1)"));
        assert!(text.contains("Highest month:   none"));
        assert!(text.contains("Last updated:    5 mins ago"));
    }

    #[test]
    fn test_render_summary_empty_bundle() {
        let text = render_summary(&StatsBundle::default(), &now());
        assert!(text.contains("Total cost:      $0.00"));
        assert!(text.contains("Highest day:     none"));
        assert!(text.contains("Last updated:    never"));
    }

    #[test]
    fn test_render_summary_unparseable_timestamp_shown_raw() {
        let stats = StatsBundle {
            last_updated: "yesterday-ish".to_string(),
            ..Default::default()
        };
        assert!(render_summary(&stats, &now()).contains("Last updated:    yesterday-ish"));
    }

    // ── ActivityPage ─────────────────────────────────────────────────────────

    #[test]
    fn test_first_page_is_most_recent() {
        let page = ActivityPage::new(&series(25), 1, 10);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_days, 25);
        assert_eq!(page.rows.len(), 10);
        assert_eq!(page.rows[0].date, date(2024, 1, 25));
        assert_eq!(page.rows[9].date, date(2024, 1, 16));
    }

    #[test]
    fn test_last_page_is_partial() {
        let page = ActivityPage::new(&series(25), 3, 10);
        assert_eq!(page.rows.len(), 5);
        assert_eq!(page.rows[0].date, date(2024, 1, 5));
        assert_eq!(page.rows[4].date, date(2024, 1, 1));
    }

    #[test]
    fn test_page_is_clamped() {
        assert_eq!(ActivityPage::new(&series(25), 99, 10).page, 3);
        assert_eq!(ActivityPage::new(&series(25), 0, 10).page, 1);
    }

    #[test]
    fn test_zero_page_size_counts_as_one() {
        let page = ActivityPage::new(&series(3), 2, 0);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].date, date(2024, 1, 2));
    }

    #[test]
    fn test_empty_series_has_one_empty_page() {
        let page = ActivityPage::new(&[], 4, 10);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert!(page.rows.is_empty());
    }

    // ── render_activity ──────────────────────────────────────────────────────

    #[test]
    fn test_render_activity_empty() {
        let text = render_activity(&ActivityPage::new(&[], 1, 10));
        assert_eq!(text, "No activity recorded yet.\n");
    }

    #[test]
    fn test_render_activity_rows() {
        let days = vec![
            DayRecord {
                total_tokens: 1_500,
                input_tokens: 200,
                output_tokens: 0,
                ..DayRecord::new(date(2024, 1, 1), 1.5)
            },
            DayRecord {
                total_tokens: 12_000,
                ..DayRecord::new(date(2024, 1, 2), 1234.0)
            },
        ];
        let text = render_activity(&ActivityPage::new(&days, 1, 10));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Recent activity (page 1 of 1, 2 days)");
        assert!(lines[1].contains("Jan 2, 2024"));
        assert!(lines[1].contains("$1,234.00"));
        assert!(lines[1].contains("12,000 tokens"));
        assert!(!lines[1].contains(" in "));
        assert!(lines[2].contains("Jan 1, 2024"));
        assert!(lines[2].contains("in 200"));
        assert!(!lines[2].contains("out "));
    }

    #[test]
    fn test_render_run() {
        let summary = RunSummary {
            prior_days: 2,
            incoming_records: 5,
            merged_days: 3,
            stats: StatsBundle::default(),
            days: Vec::new(),
        };
        assert_eq!(
            render_run(&summary),
            "Processed 5 records: 3 days stored (1 new)"
        );
    }
}
