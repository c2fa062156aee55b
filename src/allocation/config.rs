//! Configuration for order allocation.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Longest delay any configured threshold may use: ten years.
pub const MAX_DELAY_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Tuning for assignment and follow-up scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Version conflicts retried before surfacing `ConcurrencyConflict`
    pub max_conflict_retries: u32,
    /// Delay before a PENDING_ACTION order without an explicit follow-up
    /// time becomes due for reassignment
    pub follow_up_delay_seconds: u64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
            follow_up_delay_seconds: 3600,
        }
    }
}

/// A configured number of seconds as a `Duration`, or `None` if chrono
/// cannot represent it.
pub fn delay(seconds: u64) -> Option<Duration> {
    i64::try_from(seconds).ok().and_then(Duration::try_seconds)
}

/// `now` plus `seconds`, saturating at the latest representable instant.
pub fn saturating_after(now: DateTime<Utc>, seconds: u64) -> DateTime<Utc> {
    delay(seconds)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
