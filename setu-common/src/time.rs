//! Timestamp utilities
//!
//! All timestamps are stored as RFC 3339 UTC strings so that lexicographic
//! ordering in SQLite matches chronological ordering.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for storage (fixed-width, microsecond precision)
pub fn to_db(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn from_db(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Decode(format!("Failed to parse timestamp '{}': {}", value, e)))
}
