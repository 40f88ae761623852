//! Busy-retry policy and cancellation for statement execution.
//!
//! When the engine reports that the database is busy or locked, the
//! statement is run again after a fixed pause. The loop is bounded by an
//! optional attempt count and an optional wall-clock timeout, and a
//! [`CancelFlag`] shared with other threads can stop it early.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::error::{GridError, Operation, Result};

/// Pause between attempts when the database is busy.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Wall-clock bound of the default policy.
pub const DEFAULT_RETRY_TIMEOUT: Duration = Duration::from_secs(30);

// Upper bound on how long a cancel can go unnoticed while sleeping.
const CANCEL_POLL_SLICE: Duration = Duration::from_millis(25);

/// How long and how often a busy statement is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    interval: Duration,
    max_attempts: Option<u32>,
    timeout: Option<Duration>,
}

impl RetryPolicy {
    /// Retry every `interval` with no attempt or time bound.
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
            timeout: None,
        }
    }

    /// Sleep one second between attempts, forever. Only a [`CancelFlag`]
    /// ends the loop while the database stays busy.
    pub const fn unbounded() -> Self {
        Self::new(DEFAULT_RETRY_INTERVAL)
    }

    /// Run each statement once and report a busy database immediately.
    pub const fn no_retry() -> Self {
        Self::new(Duration::ZERO).with_max_attempts(1)
    }

    /// Limit the total number of attempts, the first one included. Zero is
    /// treated as one.
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(if max_attempts == 0 { 1 } else { max_attempts });
        self
    }

    /// Limit the time spent retrying, measured from the first attempt.
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub const fn interval(&self) -> Duration {
        self.interval
    }

    pub const fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Runs `attempt` until it succeeds, fails with a non-busy error, or the
    /// policy gives up.
    ///
    /// # Errors
    ///
    /// Returns the first non-busy error unchanged, [`GridError::Cancelled`]
    /// if `cancel` is raised, or [`GridError::RetryExhausted`] once the
    /// attempt or time bound is reached.
    pub fn run<T, F>(&self, op: Operation, cancel: &CancelFlag, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let started = Instant::now();
        let deadline = self.timeout.and_then(|timeout| started.checked_add(timeout));
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            let error = match attempt() {
                Ok(value) => return Ok(value),
                Err(error) if error.is_busy() => error,
                Err(error) => return Err(error),
            };

            if cancel.is_cancelled() {
                debug!("{op}: cancelled after {attempts} busy attempt(s)");
                return Err(GridError::Cancelled { op });
            }

            let exhausted = |error: GridError| {
                let elapsed = started.elapsed();
                warn!("{op}: giving up on busy database after {attempts} attempt(s) in {elapsed:?}");
                GridError::RetryExhausted {
                    op,
                    attempts,
                    elapsed,
                    source: Box::new(error),
                }
            };

            if self.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(exhausted(error));
            }

            let pause = match deadline {
                Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                    Some(remaining) if !remaining.is_zero() => self.interval.min(remaining),
                    _ => return Err(exhausted(error)),
                },
                None => self.interval,
            };

            debug!("{op}: database busy, retrying in {pause:?} (attempt {attempts})");
            if !cancel.sleep(pause) {
                debug!("{op}: cancelled while waiting to retry");
                return Err(GridError::Cancelled { op });
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_INTERVAL).with_timeout(DEFAULT_RETRY_TIMEOUT)
    }
}

/// Thread-safe flag that stops busy retries.
///
/// Clones share the same state, so one clone can be handed to a signal
/// handler or another thread while the handle keeps the other.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Retry loops stop at their next busy signal or within
    /// a short slice of their current pause.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Lower the flag so later operations retry again.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::SeqCst);
    }

    /// Sleeps for `duration` in short slices. Returns `false` as soon as the
    /// flag is raised.
    fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now().checked_add(duration);
        loop {
            if self.is_cancelled() {
                return false;
            }
            let remaining = match deadline {
                Some(deadline) => match deadline.checked_duration_since(Instant::now()) {
                    Some(remaining) => remaining,
                    None => return true,
                },
                None => CANCEL_POLL_SLICE,
            };
            if remaining.is_zero() {
                return true;
            }
            thread::sleep(remaining.min(CANCEL_POLL_SLICE));
        }
    }
}
