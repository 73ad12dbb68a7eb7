//! Popup timing options.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use layer_popup::PopupOptions;
//!
//! let options = PopupOptions::new()
//!     .with_ready_timeout(Duration::from_secs(2))
//!     .with_poll_interval(Duration::from_millis(8));
//!
//! assert_eq!(options.ready_timeout, Duration::from_secs(2));
//! ```

use std::time::Duration;

use crate::wait::{ConditionWaiter, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};

// ============================================================================
// PopupOptions
// ============================================================================

/// Timing configuration shared by every opener of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupOptions {
    /// Maximum time `load()` waits for the popup to become ready.
    pub ready_timeout: Duration,

    /// Time between readiness checks.
    pub poll_interval: Duration,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl PopupOptions {
    /// Creates options with the defaults: 5000ms timeout, 16ms poll interval.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ready_timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl PopupOptions {
    /// Sets the readiness timeout.
    #[inline]
    #[must_use]
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = timeout;
        self
    }

    /// Sets the poll interval.
    #[inline]
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Builds the readiness waiter for these options.
    #[inline]
    #[must_use]
    pub fn waiter(&self) -> ConditionWaiter {
        ConditionWaiter::new(self.ready_timeout, self.poll_interval)
    }
}

// ============================================================================
// Tests
// ============================================================================
