//! Calendar helpers for ISO `YYYY-MM-DD` strings and period boundaries.
//!
//! Weeks always start on Monday regardless of locale. An unparseable date is
//! represented as `None`; consumers exclude such values instead of failing.

use chrono::{Datelike, Duration, NaiveDate};

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Parses a `YYYY-MM-DD` string as a calendar date.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT).ok()
}

/// Formats a date as `YYYY-MM-DD`.
pub fn to_iso_date(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let delta = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(delta)
}

/// Sunday of the week containing `date`.
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + Duration::days(6)
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

pub fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// Quarter number in `1..=4`.
pub fn quarter(date: NaiveDate) -> u32 {
    date.month0() / 3 + 1
}

pub fn quarter_start(date: NaiveDate) -> NaiveDate {
    let first_month = (quarter(date) - 1) * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), first_month, 1).unwrap_or(date)
}

pub fn is_same_day(a: NaiveDate, b: NaiveDate) -> bool {
    a == b
}

pub fn is_same_week(a: NaiveDate, b: NaiveDate) -> bool {
    week_start(a) == week_start(b)
}

pub fn is_same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

pub fn is_same_year(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year()
}

/// Three-letter English month name for a 1-based month, empty when out of range.
pub fn month_short_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTHS_SHORT.get(idx as usize))
        .copied()
        .unwrap_or("")
}

/// Formats a date as `DD Mon`, e.g. `05 Jan`.
pub fn format_short_date(date: NaiveDate) -> String {
    format!("{:02} {}", date.day(), month_short_name(date.month()))
}

/// Formats an amount with two decimals and comma thousands separators.
/// Non-finite values render as zero.
pub fn format_amount(amount: f64) -> String {
    let value = if amount.is_finite() { amount } else { 0.0 };
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed.chars().any(|c| c != '0' && c != '.');
    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}
