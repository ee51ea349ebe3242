use std::time::{SystemTime, UNIX_EPOCH};

/// Unix timestamp in seconds, `0` if the clock is set before the epoch
pub fn current_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

pub fn is_expired(timestamp: i64, timeout: i64, current_time: i64) -> bool {
    current_time - timestamp > timeout
}
