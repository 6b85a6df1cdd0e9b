use chrono::{DateTime, Duration, Utc};

/// Converts minutes to seconds
pub const fn minutes_secs(minutes: i64) -> i64 {
    minutes * 60
}

/// Returns the earliest time a redelivered message may be received again.
///
/// # Arguments
/// * `delay_minutes` - Minutes to add to the current time. Negative values are
///   treated as zero.
pub fn calculate_redelivery_time(delay_minutes: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(minutes_secs(delay_minutes.max(0)))
}
