//! Bounded, sequential retries with jittered constant backoff.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Treated as at least 1.
    pub max_attempts: usize,
    /// Nominal pause between attempts; the actual pause is drawn from
    /// `[delay / 2, delay * 3 / 2]`.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// No pause between attempts.
    pub fn immediate(max_attempts: usize) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Runs `operation` until it succeeds or `max_attempts` attempts have
    /// failed, then returns the last error. `operation` receives the 1-based
    /// attempt number.
    pub fn run<T, E, F>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut(usize) -> Result<T, E>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if attempt >= max_attempts => {
                    tracing::error!(
                        operation = operation_name,
                        attempts = attempt,
                        error = %err,
                        "giving up after final attempt"
                    );
                    return Err(err);
                }
                Err(err) => {
                    let pause = self.jittered_delay();
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        error = %err,
                        "attempt failed, retrying in {:?}",
                        pause
                    );
                    if !pause.is_zero() {
                        thread::sleep(pause);
                    }
                    attempt += 1;
                }
            }
        }
    }

    fn jittered_delay(&self) -> Duration {
        if self.delay.is_zero() {
            return Duration::ZERO;
        }
        let factor = rand::rng().random_range(0.5..=1.5);
        self.delay.mul_f64(factor)
    }
}
