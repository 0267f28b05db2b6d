//! Small parsing helpers shared by the canonicalizers.

use serde_json::Value;

/// Read a non-empty trimmed string field.
pub fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Extract the first four-digit year from a free-form date string.
///
/// Handles "1650-01-01", "ca. 1650", "1650" and similar; returns `None` when
/// no four-digit run is present.
pub fn year_from_text(text: &str) -> Option<i32> {
    digit_runs(text, 4, 4).into_iter().next()
}

/// Extract a `(min, max)` year range from a free-form date string.
///
/// Accepts three- and four-digit years ("c. 950", "1630-1635"). A single
/// year yields a degenerate range.
pub fn year_range(text: &str) -> Option<(i32, i32)> {
    let years = digit_runs(text, 3, 4);
    let min = *years.iter().min()?;
    let max = *years.iter().max()?;
    Some((min, max))
}

/// All maximal digit runs of length `min_len..=max_len`, parsed as integers.
fn digit_runs(text: &str, min_len: usize, max_len: usize) -> Vec<i32> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for c in text.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() {
            current.push(c);
        } else {
            if (min_len..=max_len).contains(&current.len()) {
                if let Ok(year) = current.parse() {
                    runs.push(year);
                }
            }
            current.clear();
        }
    }
    runs
}
