//! Relative "N units ago" labels for request timestamps

use chrono::{DateTime, Utc};

/// Format the age of `timestamp` relative to `now`.
///
/// Picks the coarsest whole unit (days, hours, minutes, seconds) using floor
/// division. Timestamps in the future are clamped to "0 seconds ago".
pub fn relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - timestamp).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{} days ago", days)
    } else if hours > 0 {
        format!("{} hours ago", hours)
    } else if minutes > 0 {
        format!("{} minutes ago", minutes)
    } else {
        format!("{} seconds ago", seconds)
    }
}

/// Format the age of `timestamp` relative to the wall clock
pub fn relative_time_from_now(timestamp: DateTime<Utc>) -> String {
    relative_time(timestamp, Utc::now())
}
