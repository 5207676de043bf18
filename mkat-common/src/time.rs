//! Timestamp utilities
//!
//! All timestamps are persisted as RFC 3339 UTC strings with second precision
//! (`2026-10-17T08:00:00Z`) so that string comparison in SQL matches
//! chronological order.

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp in the canonical storage format
pub fn to_db_string(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Calendar date (`YYYY-MM-DD`) of a timestamp
pub fn to_date_string(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d").to_string()
}

/// Storage string for `days` days before `reference`
pub fn days_before(reference: DateTime<Utc>, days: i64) -> String {
    to_db_string(reference - Duration::days(days))
}

/// Storage string for `days` days after `reference`
pub fn days_after(reference: DateTime<Utc>, days: i64) -> String {
    to_db_string(reference + Duration::days(days))
}
