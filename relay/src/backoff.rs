//! Exponential reconnect backoff with a fixed attempt budget.

use std::time::Duration;

/// Doubling backoff policy: delays follow `base * 2^attempt`.
///
/// Once the attempt budget is spent, [`Backoff::next_delay`] yields `None`
/// until [`Backoff::reset`] re-arms it. With the default relay policy
/// (base 1 s, 5 attempts) the sequence is 1 s, 2 s, 4 s, 8 s, 16 s.
#[derive(Clone, Debug)]
pub struct Backoff {
    base: Duration,
    max_attempts: u32,
    attempts: u32,
}

impl Backoff {
    #[must_use]
    pub fn new(base: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max_attempts,
            attempts: 0,
        }
    }

    /// Attempts consumed since the last reset.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether the attempt budget is spent.
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }

    /// The delay to wait before the next reconnect attempt, or `None` when
    /// the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.exhausted() {
            return None;
        }

        let delay = self.base.saturating_mul(2_u32.saturating_pow(self.attempts));
        self.attempts += 1;
        Some(delay)
    }

    /// Re-arm the budget after a successful connection.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
#[path = "backoff_test.rs"]
mod tests;
