//! `YYYY-MM-DD` text handling for the date inputs.

use chrono::{Datelike, NaiveDate};

/// Length of a well-formed `YYYY-MM-DD` string.
const YMD_LENGTH: usize = 10;

/// Parse a `YYYY-MM-DD` string into a calendar date.
///
/// The input must be exactly ten characters: a four-digit year, a month and a
/// day separated by `-`, naming a real calendar day. Anything else (including
/// `2024-13-40` or `2024-02-30`) returns `None`.
///
/// ```
/// use shoplog_core::date_range::parse_ymd;
///
/// assert!(parse_ymd("2024-03-10").is_some());
/// assert!(parse_ymd("2024-13-40").is_none());
/// assert!(parse_ymd("2024-3-10").is_none());
/// ```
#[must_use]
pub fn parse_ymd(input: &str) -> Option<NaiveDate> {
    if input.len() != YMD_LENGTH {
        return None;
    }

    let mut parts = input.split('-');
    let (year, month, day) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || year.len() != 4 {
        return None;
    }
    let all_digits = |s: &str| !s.is_empty() && s.len() <= 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !year.bytes().all(|b| b.is_ascii_digit()) || !all_digits(month) || !all_digits(day) {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Whether `input` is a valid `YYYY-MM-DD` date.
#[must_use]
pub fn is_valid_ymd(input: &str) -> bool {
    parse_ymd(input).is_some()
}

/// Format a date as zero-padded `YYYY-MM-DD`.
#[must_use]
pub fn format_ymd(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}
