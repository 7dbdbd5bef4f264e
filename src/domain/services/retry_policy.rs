//! Backoff applied after a failed delivery attempt.
//!
//! `delay = min(2^retry_count, 30)` minutes. The count passed in is the count *after*
//! the failure was recorded, so the first retry waits 2 minutes. There is no jitter
//! and no attempt ceiling.

use chrono::{DateTime, Duration, Utc};

pub const MAX_BACKOFF_MINUTES: u64 = 30;

pub fn next_delay_minutes(retry_count: u32) -> u64 {
    // 2^5 already exceeds the cap
    if retry_count >= 5 {
        return MAX_BACKOFF_MINUTES;
    }
    (1u64 << retry_count).min(MAX_BACKOFF_MINUTES)
}

pub fn next_delay(retry_count: u32) -> Duration {
    Duration::minutes(next_delay_minutes(retry_count) as i64)
}

pub fn next_retry_at(retry_count: u32, now: DateTime<Utc>) -> DateTime<Utc> {
    now + next_delay(retry_count)
}
