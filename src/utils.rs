use chrono::{DateTime, TimeZone, Utc};

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{} ago", n, unit, if n > 1 { "s" } else { "" })
}

/// Coarse age label for a millisecond timestamp, e.g. "3 hours ago".
pub fn format_relative_time(timestamp_ms: i64, now: DateTime<Utc>) -> String {
    let diff_ms = now.timestamp_millis() - timestamp_ms;
    let seconds = diff_ms / 1000;
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        plural(days, "day")
    } else if hours > 0 {
        plural(hours, "hour")
    } else if minutes > 0 {
        plural(minutes, "minute")
    } else {
        "Just now".to_string()
    }
}

pub fn format_timestamp(timestamp_ms: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => timestamp_ms.to_string(),
    }
}
