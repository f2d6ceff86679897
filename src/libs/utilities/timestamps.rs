use chrono::{DateTime, Utc};

/// Returns the current timestamp in RFC 3339 format (ISO 8601).
///
/// # Returns
/// A `String` containing the current UTC timestamp in RFC 3339 format.
/// Example: "2023-12-07T10:30:45.123456789+00:00"
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Converts an RFC 3339 timestamp into a human-readable relative time string.
///
/// # Returns
/// * `Some(String)` - e.g. "2 days ago", "3 hours ago", "just now"
/// * `None` - If the timestamp cannot be parsed
pub fn time_since(timestamp: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|dt| describe_age(&dt.with_timezone(&Utc)))
        .ok()
}

/// Relative age of `moment` against now, in the most appropriate unit.
pub fn describe_age(moment: &DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(*moment);

    if duration.num_days() > 0 {
        format!("{} days ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{} hours ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{} minutes ago", duration.num_minutes())
    } else {
        "just now".to_string()
    }
}
