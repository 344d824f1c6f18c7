//! Exponential retry delay with jitter.

use std::time::Duration;

/// Doubles from `base` on every call up to `max`, then adds up to a quarter
/// of the delay as random jitter.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            attempt: 0,
        }
    }

    /// The next delay; advances the attempt counter.
    pub fn next_delay(&mut self) -> Duration {
        let factor = 1u32.checked_shl(self.attempt).unwrap_or(u32::MAX);
        let capped = self.base.saturating_mul(factor).min(self.max);
        let quarter = capped.as_millis() as u64 / 4;
        let jitter = rand::random::<u64>() % (quarter + 1);
        self.attempt = self.attempt.saturating_add(1);
        capped + Duration::from_millis(jitter)
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
