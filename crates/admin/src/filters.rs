//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Characters kept by [`excerpt`] before truncating.
const EXCERPT_CHARS: usize = 80;

/// Shorten a value to a single line of at most 80 characters.
///
/// Usage in templates: `{{ event.message|excerpt }}`
#[askama::filter_fn]
pub fn excerpt(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(truncate(&value.to_string(), EXCERPT_CHARS))
}

fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default().trim();
    if line.chars().count() <= max && line.len() == text.trim().len() {
        return line.to_string();
    }
    let mut out: String = line.chars().take(max).collect();
    out.push('…');
    out
}
