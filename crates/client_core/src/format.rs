use chrono::{DateTime, Utc};

use crate::filter::DateRange;

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y/%m/%d";

pub fn format_timestamp(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|value| value.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

/// Elapsed time between two timestamps, empty unless both are known and
/// ordered.
pub fn format_duration(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> String {
    let (Some(start), Some(end)) = (start, end) else {
        return String::new();
    };
    let elapsed = end.signed_duration_since(start).num_seconds();
    if elapsed < 0 {
        return String::new();
    }

    let hours = elapsed / 3600;
    let minutes = (elapsed % 3600) / 60;
    let seconds = elapsed % 60;
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

pub fn format_date_range(range: &DateRange) -> String {
    if range.is_unbounded() {
        return String::new();
    }
    let side = |value: Option<DateTime<Utc>>| {
        value
            .map(|value| value.format(DATE_FORMAT).to_string())
            .unwrap_or_default()
    };
    format!("{} - {}", side(range.from), side(range.to))
        .trim()
        .to_string()
}
