//! Cell formatting shared by both renderers.

use std::time::Duration;

use mview_core::DisplayRow;

/// Display form of a raw sample value.
///
/// Values with a decimal point are shown with two decimals, or none when in
/// `e+` notation. Integers, `+Inf`, `NaN` and anything unparsable pass through.
pub fn format_value(raw: &str) -> String {
    if !raw.contains('.') {
        return raw.to_string();
    }
    match raw.parse::<f64>() {
        Ok(v) if raw.contains("e+") => format!("{v:.0}"),
        Ok(v) => format!("{v:.2}"),
        Err(_) => raw.to_string(),
    }
}

/// `key=value` pairs of the row's non-empty labels, keys in order.
pub fn labels_display(row: &DisplayRow) -> String {
    row.present_labels()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cut `s` to `width` characters, marking the cut with `...`.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    if width <= 3 {
        return s.chars().take(width).collect();
    }
    let mut cut: String = s.chars().take(width - 3).collect();
    cut.push_str("...");
    cut
}

/// "N seconds ago" up to "N years ago", in whole units.
pub fn human_duration(elapsed: Duration) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;
    const MONTH: u64 = 30 * DAY;
    const YEAR: u64 = 365 * DAY;

    let secs = elapsed.as_secs();
    match secs {
        s if s < MINUTE => format!("{s} seconds ago"),
        s if s < HOUR => format!("{} minutes ago", s / MINUTE),
        s if s < DAY => format!("{} hours ago", s / HOUR),
        s if s < MONTH => format!("{} days ago", s / DAY),
        s if s < YEAR => format!("{} months ago", s / MONTH),
        s => format!("{} years ago", s / YEAR),
    }
}
