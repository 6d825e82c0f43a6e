//! Small tokio helpers shared by every binary, grounded on the teacher's
//! own `spawn_task` convention for background tasks and its capped
//! exponential backoff used for reconnect/retry loops.

use std::time::Duration;

use log::error;
use tokio::task::JoinHandle;

/// Spawn a background task. A thin wrapper over `tokio::spawn` kept around
/// so every long-lived task in the gateway goes through one call site,
/// matching the teacher's `spawn_task(name, ...)` convention even though
/// stable tokio has nowhere to attach the name itself.
pub fn spawn_task<F>(_name: &'static str, future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::spawn(future)
}

/// Capped exponential backoff for retry loops (commit/abort retries at the
/// coordinator, reconnect loops at the client and at startup registration).
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    cap: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base,
            cap,
            attempt: 0,
        }
    }

    /// Delay for the next attempt, doubling each time up to `cap`.
    pub fn next_delay(&mut self) -> Duration {
        let factor = 1u64.checked_shl(self.attempt).unwrap_or(u64::MAX);
        // Clamp before the u32 narrowing cast `Duration::checked_mul` wants -
        // `factor as u32` alone would wrap a large power of two back to 0.
        let factor = factor.min(u32::MAX as u64) as u32;
        let delay = self
            .base
            .checked_mul(factor)
            .unwrap_or(self.cap)
            .min(self.cap);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }
}

/// Log and swallow a background-task error; used where a task's failure
/// must not crash the process (e.g. a best-effort abort sweep).
pub fn log_background_error<E: std::fmt::Display>(context: &str, err: E) {
    if log::log_enabled!(log::Level::Error) {
        error!("{context}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_cap() {
        let mut backoff = Backoff::new(Duration::from_millis(200), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(), Duration::from_millis(400));
        assert_eq!(backoff.next_delay(), Duration::from_millis(800));
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    // Regression test for a truncating `as u32` cast that used to wrap
    // `factor` back to 0 once `attempt` reached 32, turning the capped
    // backoff into a zero-delay busy loop for the next 32 calls.
    #[test]
    fn backoff_stays_capped_past_32_attempts() {
        let mut backoff = Backoff::new(Duration::from_millis(200), Duration::from_secs(1));
        for attempt in 0..40 {
            let delay = backoff.next_delay();
            if attempt >= 3 {
                assert_eq!(delay, Duration::from_secs(1), "attempt {attempt} fell off the cap");
            }
        }
        let mut backoff = Backoff::new(Duration::from_millis(1), Duration::from_secs(5));
        for attempt in 0..64 {
            let delay = backoff.next_delay();
            assert!(delay <= Duration::from_secs(5), "attempt {attempt} produced {delay:?}");
            assert!(delay > Duration::ZERO, "attempt {attempt} produced zero delay");
        }
    }
}
