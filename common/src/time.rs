// A simple module to define the time types used across the gateway.
//
// Unlike a blockchain, nothing here needs to be deterministic across
// nodes: timestamps are used only for logging, hold deadlines and
// durable-log bookkeeping, so `SystemTime::now()` is fine everywhere.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub type TimestampSeconds = u64;

#[inline]
pub fn get_current_time() -> Duration {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
}

pub fn get_current_time_in_seconds() -> TimestampSeconds {
    get_current_time().as_secs()
}
