use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Render `value` rounded to `decimals` places with comma-grouped digits.
///
/// # Examples
///
/// ```
/// use stats_core::formatting::format_number;
///
/// assert_eq!(format_number(48210.76, 1), "48,210.8");
/// assert_eq!(format_number(3.0, 0), "3");
/// assert_eq!(format_number(-1500.0, 0), "-1,500");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let fixed = format!("{:.*}", decimals as usize, value.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut out = group_thousands(whole);
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }

    // Values that round to zero never get a minus sign.
    let rounds_to_zero = fixed.bytes().all(|b| b == b'0' || b == b'.');
    if value < 0.0 && !rounds_to_zero {
        out.insert(0, '-');
    }
    out
}

/// Token count with comma-grouped digits.
pub fn format_tokens(tokens: u64) -> String {
    group_thousands(&tokens.to_string())
}

/// Cost as dollars and cents, e.g. `"$12,480.05"`. A negative amount keeps
/// its sign after the symbol (`"$-0.50"`).
pub fn format_currency(amount: f64) -> String {
    format!("${}", format_number(amount, 2))
}

/// Format a calendar date for display, e.g. `"Jan 5, 2024"`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Describe how long before `now` the instant `then` was.
///
/// * `< 60` minutes → `"1 min ago"` / `"12 mins ago"`
/// * `< 24` hours → `"3 hours ago"`
/// * `< 7` days → `"2 days ago"`
/// * otherwise the calendar date of `then` (UTC)
///
/// Instants in the future are reported as `"0 mins ago"`.
pub fn format_relative_time<T: TimeZone>(then: DateTime<Utc>, now: &DateTime<T>) -> String {
    let diff = now.with_timezone(&Utc) - then;
    let mins = diff.num_minutes().max(0);
    let hours = diff.num_hours().max(0);
    let days = diff.num_days().max(0);

    if mins < 60 {
        format!("{} min{} ago", mins, plural(mins))
    } else if hours < 24 {
        format!("{} hour{} ago", hours, plural(hours))
    } else if days < 7 {
        format!("{} day{} ago", days, plural(days))
    } else {
        format_date(then.date_naive())
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Comma-separate an unsigned run of ASCII digits in groups of three.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
