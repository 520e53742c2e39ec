//! Datetime aliases shared by entities and services

use chrono::{DateTime, Utc};

/// Database DateTime type used across all Civitas crates
///
/// Canonical type for TIMESTAMPTZ columns such as `created_at` and
/// `delivered_at`.
pub type DBDateTime = DateTime<Utc>;

/// Standard UTC DateTime type used outside of the persistence layer
pub type UtcDateTime = DateTime<Utc>;

/// Current time as a [`UtcDateTime`]
pub fn utc_now() -> UtcDateTime {
    Utc::now()
}
