use chrono::{DateTime, Utc};

/// Backups younger than this many hours count as recent.
pub const RECENCY_THRESHOLD_HOURS: f64 = 25.0;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Age of `created_at` relative to `now` in fractional hours, and whether it is recent.
pub fn classify(created_at: DateTime<Utc>, now: DateTime<Utc>) -> (f64, bool) {
    let age = now.signed_duration_since(created_at);
    let age_seconds = match age.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => age.num_seconds() as f64,
    };
    let age_hours = age_seconds / SECONDS_PER_HOUR;
    (age_hours, is_recent(age_hours))
}

pub fn is_recent(age_hours: f64) -> bool {
    age_hours < RECENCY_THRESHOLD_HOURS
}
