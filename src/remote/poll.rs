//! Bounded, fixed-delay polling for remote resources that take a moment to appear.

use crate::constants::{POLL_ATTEMPTS, POLL_DELAY_MS};
use std::{thread, time::Duration};
use tracing::warn;

/// A bounded poll: at most `attempts` checks, `delay` apart.
///
/// Polling is best-effort. A poll that runs out of attempts only means the resource was not observed in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Poll {
    attempts: usize,
    delay: Duration,
}

impl Default for Poll {
    fn default() -> Self {
        Self::new(POLL_ATTEMPTS, Duration::from_millis(POLL_DELAY_MS))
    }
}

impl Poll {
    /// Creates a new [Poll]. At least one attempt is always made.
    pub fn new(attempts: usize, delay: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// Runs `check` until it returns `true` or the attempts are exhausted.
    ///
    /// ## Returns
    /// - `true` - If `check` succeeded on some attempt.
    /// - `false` - If every attempt failed.
    pub fn until<F: FnMut() -> bool>(&self, what: &str, mut check: F) -> bool {
        for attempt in 1..=self.attempts {
            if check() {
                return true;
            }
            if attempt < self.attempts {
                warn!(attempt, what, "not visible yet, retrying");
                thread::sleep(self.delay);
            }
        }
        false
    }
}
