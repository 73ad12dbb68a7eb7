//! Deadline-bounded condition waits.
//!
//! [`ConditionWaiter`] polls a predicate on a fixed interval until it holds or
//! the deadline passes. Each wait settles exactly once:
//!
//! - the first tick fires immediately, so an already-true predicate resolves
//!   without delay;
//! - on every tick the deadline is checked first, and once it has passed the
//!   wait fails with [`Error::Timeout`] without evaluating the predicate again;
//! - dropping the future cancels the wait, and [`CancelHandle`] cancels it from
//!   elsewhere.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use layer_popup::wait::ConditionWaiter;
//!
//! # async fn example(ready: impl FnMut() -> bool) -> layer_popup::Result<()> {
//! let waiter = ConditionWaiter::new(Duration::from_secs(5), Duration::from_millis(16));
//! waiter.wait(ready).await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, trace};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default readiness timeout (5 seconds).
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Default poll interval (one 60 Hz frame).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(16);

/// Lower bound for the poll interval; tokio intervals reject a zero period.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

// ============================================================================
// CancelHandle
// ============================================================================

/// Cancels in-flight waits started with [`ConditionWaiter::wait_with_cancel`].
///
/// Cloning yields a handle to the same cancellation flag.
#[derive(Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    /// Creates a handle in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Cancels every wait using this handle. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns `true` once [`cancel`](Self::cancel) has been called.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Completes once the handle is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

// ============================================================================
// ConditionWaiter
// ============================================================================

/// Polls a predicate until it holds or a deadline passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionWaiter {
    /// Maximum time to wait.
    timeout: Duration,
    /// Time between predicate evaluations.
    poll_interval: Duration,
}

impl Default for ConditionWaiter {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_TIMEOUT, DEFAULT_POLL_INTERVAL)
    }
}

impl ConditionWaiter {
    /// Creates a waiter.
    ///
    /// A poll interval below 1ms is raised to 1ms.
    #[must_use]
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
        }
    }

    /// Returns the timeout.
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the poll interval.
    #[inline]
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Waits until `predicate` returns `true`.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if the predicate does not hold before the deadline
    pub async fn wait<P>(&self, predicate: P) -> Result<()>
    where
        P: FnMut() -> bool,
    {
        self.run(predicate, None).await
    }

    /// Waits until `predicate` returns `true` or `cancel` is cancelled.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if the predicate does not hold before the deadline
    /// - [`Error::Cancelled`] if the handle is cancelled first
    pub async fn wait_with_cancel<P>(&self, predicate: P, cancel: &CancelHandle) -> Result<()>
    where
        P: FnMut() -> bool,
    {
        self.run(predicate, Some(cancel)).await
    }

    async fn run<P>(&self, mut predicate: P, cancel: Option<&CancelHandle>) -> Result<()>
    where
        P: FnMut() -> bool,
    {
        let start = Instant::now();
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks: u64 = 0;

        loop {
            match cancel {
                Some(handle) => {
                    tokio::select! {
                        biased;
                        () = handle.cancelled() => {
                            debug!(ticks, "Condition wait cancelled");
                            return Err(Error::cancelled("condition wait"));
                        }
                        _ = ticker.tick() => {}
                    }
                }
                None => {
                    ticker.tick().await;
                }
            }
            ticks += 1;

            let elapsed = start.elapsed();
            if elapsed > self.timeout {
                debug!(
                    ticks,
                    elapsed_ms = elapsed.as_millis() as u64,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Condition wait timed out"
                );
                return Err(Error::timeout(
                    "condition wait",
                    self.timeout.as_millis() as u64,
                ));
            }

            if predicate() {
                debug!(
                    ticks,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Condition satisfied"
                );
                return Ok(());
            }

            trace!(ticks, "Condition not yet satisfied");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;

    #[test]
    fn test_default_waiter() {
        let waiter = ConditionWaiter::default();
        assert_eq!(waiter.timeout(), Duration::from_millis(5000));
        assert_eq!(waiter.poll_interval(), Duration::from_millis(16));
    }

    #[test]
    fn test_zero_poll_interval_is_clamped() {
        let waiter = ConditionWaiter::new(Duration::from_secs(1), Duration::ZERO);
        assert_eq!(waiter.poll_interval(), Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_true_predicate_resolves_on_first_tick() {
        let calls = Cell::new(0);
        let start = Instant::now();

        ConditionWaiter::default()
            .wait(|| {
                calls.set(calls.get() + 1);
                true
            })
            .await
            .expect("predicate already true");

        assert_eq!(calls.get(), 1);
        assert!(start.elapsed() < DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_predicate_polled_until_true() {
        let calls = Cell::new(0);

        ConditionWaiter::default()
            .wait(|| {
                calls.set(calls.get() + 1);
                calls.get() == 3
            })
            .await
            .expect("true on third tick");

        assert_eq!(calls.get(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_never_true_times_out_after_deadline() {
        let start = Instant::now();
        let err = ConditionWaiter::default()
            .wait(|| false)
            .await
            .expect_err("must time out");

        let elapsed = start.elapsed();
        assert!(err.is_timeout());
        assert!(elapsed > DEFAULT_WAIT_TIMEOUT, "rejected early: {elapsed:?}");
        assert!(elapsed <= DEFAULT_WAIT_TIMEOUT + 2 * DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_and_success_never_both_settle() {
        // The predicate only becomes true once the deadline has passed; the
        // wait must time out and never evaluate it past the deadline.
        let timeout = Duration::from_millis(100);
        let start = Instant::now();
        let late_calls = Cell::new(0);

        let result = ConditionWaiter::new(timeout, Duration::from_millis(10))
            .wait(|| {
                let late = start.elapsed() > timeout;
                if late {
                    late_calls.set(late_calls.get() + 1);
                }
                late
            })
            .await;

        assert!(result.expect_err("timeout wins").is_timeout());
        assert_eq!(late_calls.get(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_wait() {
        let cancel = CancelHandle::new();
        let remote = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            remote.cancel();
        });

        let err = ConditionWaiter::default()
            .wait_with_cancel(|| false, &cancel)
            .await
            .expect_err("cancelled");

        assert!(matches!(err, Error::Cancelled { .. }));
        assert!(cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_handle_wins_first_tick() {
        let cancel = CancelHandle::new();
        cancel.cancel();

        let result = ConditionWaiter::default()
            .wait_with_cancel(|| true, &cancel)
            .await;

        assert!(matches!(result, Err(Error::Cancelled { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_uncancelled_handle_does_not_interfere() {
        let cancel = CancelHandle::new();
        ConditionWaiter::default()
            .wait_with_cancel(|| true, &cancel)
            .await
            .expect("resolves");
        assert!(!cancel.is_cancelled());
    }
}
