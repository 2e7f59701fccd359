//! SQLite type conversion helpers.
//!
//! SQLite has no native UUID or date types. Ids are stored as hyphenated
//! TEXT, calendar dates as ISO-8601 `YYYY-MM-DD` TEXT (lexicographic
//! order equals chronological order), and row timestamps as RFC 3339
//! TEXT. Every repository goes through these helpers so the encodings
//! stay uniform.

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

// ============================================================================
// UUID Helpers
// ============================================================================

/// Convert a UUID to its SQLite TEXT form
#[inline]
pub fn uuid_to_str(id: Uuid) -> String {
    id.to_string()
}

/// Parse a SQLite string back to a UUID
#[inline]
pub fn str_to_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| anyhow!("invalid UUID '{}': {}", s, e))
}

// ============================================================================
// Calendar Date Helpers (stored as YYYY-MM-DD TEXT)
// ============================================================================

/// Convert an optional date to its optional TEXT form
#[inline]
pub fn date_opt_to_str(d: Option<NaiveDate>) -> Option<String> {
    d.map(|d| d.to_string())
}

/// Parse a stored date string
#[inline]
pub fn str_to_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| anyhow!("invalid date '{}': {}", s, e))
}

/// Parse an optional stored date string
#[inline]
pub fn str_to_date_opt(s: Option<&str>) -> Result<Option<NaiveDate>> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(str_to_date(s)?)),
        _ => Ok(None),
    }
}

// ============================================================================
// Timestamp Helpers (stored as RFC 3339 TEXT)
// ============================================================================

/// Convert a chrono DateTime to RFC 3339 TEXT
#[inline]
pub fn datetime_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Parse a stored timestamp string
#[inline]
pub fn str_to_datetime(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| anyhow!("invalid datetime '{}': {}", s, e))
}
