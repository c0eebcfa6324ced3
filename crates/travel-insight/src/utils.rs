//! Shared parsing and statistics helpers.
//!
//! Raw survey tables are read with every column as text; these helpers turn
//! individual cells into typed values. A cell that cannot be parsed becomes
//! `None` and is never reported as an error.

use chrono::NaiveDate;
use std::cmp::Ordering;

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Characters commonly used in numeric formatting that should be stripped.
pub const NUMERIC_FORMAT_CHARS: [char; 4] = [',', '₩', '%', ' '];

/// Common error/missing value markers in survey exports.
pub const ERROR_MARKERS: [&str; 8] = [
    "error", "unknown", "n/a", "na", "nan", "null", "none", "#n/a",
];

/// Date layouts seen across survey years.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Clean a string for numeric parsing by removing formatting characters.
pub fn clean_numeric_string(s: &str) -> String {
    let mut result = s.trim().to_string();
    for c in NUMERIC_FORMAT_CHARS {
        result = result.replace(c, "");
    }
    result
}

/// Check if a string is an error/missing value marker.
pub fn is_error_marker(s: &str) -> bool {
    let lower = s.trim().to_ascii_lowercase();
    ERROR_MARKERS.iter().any(|&marker| lower == marker)
}

/// Normalize a raw cell: blank and marker values become `None`.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !is_error_marker(v))
}

/// Try to parse a string as a numeric value (f64).
///
/// Handles thousands separators and currency symbols. Non-finite results are
/// rejected.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    if is_error_marker(s) {
        return None;
    }
    let cleaned = clean_numeric_string(s);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a code cell such as `"21"` or `"21.0"` into an integer code.
pub fn parse_code(s: &str) -> Option<i64> {
    let value = parse_numeric_string(s)?;
    (value.fract() == 0.0).then_some(value as i64)
}

/// Parse a date cell, accepting plain dates and timestamps.
///
/// Only the leading date part of a timestamp is used, so
/// `"2022-09-13 10:00:00"` parses as 2022-09-13.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let date_part = trimmed
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or(trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Split a delimiter-separated code list into trimmed, non-empty codes.
pub fn split_codes(value: Option<&str>, delimiter: char) -> Vec<String> {
    match non_blank(value) {
        Some(text) => text
            .split(delimiter)
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

/// Compare two cells numerically when both parse as numbers, else as text.
/// Missing values sort last.
pub fn compare_cells(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => match (parse_numeric_string(x), parse_numeric_string(y)) {
            (Some(nx), Some(ny)) => nx.partial_cmp(&ny).unwrap_or(Ordering::Equal),
            _ => x.cmp(y),
        },
    }
}

// =============================================================================
// Statistics Utilities
// =============================================================================

/// Median of the present values, `None` when nothing is present.
pub fn median(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let mut present: Vec<f64> = values.into_iter().flatten().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = present.len() / 2;
    if present.len() % 2 == 0 {
        Some((present[mid - 1] + present[mid]) / 2.0)
    } else {
        Some(present[mid])
    }
}

/// Mean of the present values, `None` when nothing is present.
pub fn mean(values: impl IntoIterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .flatten()
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Round to the nearest integer, ties to even.
pub fn round_to_i64(value: f64) -> i64 {
    value.round_ties_even() as i64
}

/// Render a number for a text cell: integral values without a fraction.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================
