//! Date recovery from slot-dialog text.
//!
//! The booking dialog renders "Tuesday, March 11, 2026" but drops the year
//! when the date falls in the displayed year ("Tuesday, March 11"). The
//! missing year is recovered from the calendar header ("March 2026")
//! rendered elsewhere on the page.
//!
//! Known limitation: near a year boundary the header year can disagree with
//! the dialog's date (header still "December 2025" while the dialog shows
//! "Friday, January 2"). The header year is used as-is.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::{Regex, RegexBuilder};

use crate::types::CalendarDate;

const WEEKDAYS: &str = "Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday";
const MONTHS: &str =
    "January|February|March|April|May|June|July|August|September|October|November|December";

fn case_insensitive(source: &str) -> Regex {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("built-in date pattern must compile: {e}"))
}

static FULL_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    case_insensitive(&format!(
        r"\b({WEEKDAYS}),\s*({MONTHS})\s+([1-9]|[12]\d|3[01]),\s*(20\d{{2}})\b"
    ))
});

static DAY_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| {
    case_insensitive(&format!(
        r"\b({WEEKDAYS}),\s*({MONTHS})\s+([1-9]|[12]\d|3[01])\b"
    ))
});

static MONTH_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| case_insensitive(&format!(r"\b({MONTHS})\s+(20\d{{2}})\b")));

/// 1-based month number for an English month name (any case).
pub fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    MONTHS
        .split('|')
        .position(|m| m.eq_ignore_ascii_case(&lower))
        .map(|i| i as u32 + 1)
}

/// Parse a calendar date out of dialog text.
///
/// A full "Weekday, Month D, YYYY" match is authoritative and ignores
/// `fallback_year`. A "Weekday, Month D" match needs `fallback_year`;
/// without it the result is `None`. Impossible dates (February 30) yield
/// `None`. The weekday is matched but not cross-checked against the date.
pub fn parse_dialog_date(text: &str, fallback_year: Option<i32>) -> Option<CalendarDate> {
    if let Some(caps) = FULL_DATE_RE.captures(text) {
        let month = month_number(&caps[2])?;
        let day: u32 = caps[3].parse().ok()?;
        let year: i32 = caps[4].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    let caps = DAY_ONLY_RE.captures(text)?;
    let year = fallback_year?;
    let month = month_number(&caps[2])?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// First "Month YYYY" year found in page text, if any.
pub fn infer_year(page_text: &str) -> Option<i32> {
    MONTH_YEAR_RE
        .captures(page_text)
        .and_then(|caps| caps[2].parse().ok())
}

/// Render a date the way the widget's dialog does ("Tuesday, March 11, 2026").
#[cfg(test)]
pub(crate) fn format_dialog_date(date: CalendarDate, with_year: bool) -> String {
    if with_year {
        date.format("%A, %B %-d, %Y").to_string()
    } else {
        date.format("%A, %B %-d").to_string()
    }
}

// ─── Tests ──────────────────────────────────────────────────────
