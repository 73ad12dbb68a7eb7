//! Popup dismissal detection.
//!
//! A layer popup is closed by hiding it, not by destroying it. The
//! [`VisibilityObserver`] watches the popup container's `style` attribute and
//! fires a close handler the first time the computed display becomes `none`.
//!
//! The observer:
//!
//! - fires at most once, however many style mutations arrive in the same or
//!   in later batches;
//! - disconnects its subscription when it fires;
//! - ignores every attribute other than `style`;
//! - has no timeout and no external cancellation.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use layer_popup::dom::Element;
//! use layer_popup::observer::VisibilityObserver;
//!
//! # async fn example(element: Element) {
//! let observer = VisibilityObserver::attach(&element, Some(Arc::new(|| println!("closed"))));
//! observer.closed().await;
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;
use tracing::{debug, info};

use crate::dom::{AttributeSubscription, Element, STYLE_ATTRIBUTE};
use crate::identifiers::NodeId;

// ============================================================================
// Types
// ============================================================================

/// Close handler callback type.
pub type CloseHandler = Arc<dyn Fn() + Send + Sync>;

/// Internal shared state for an observer.
struct ObserverInner {
    /// Observed element.
    node: NodeId,
    /// Set exactly once, when the popup is seen hidden.
    fired: AtomicBool,
    /// Broadcasts closure to [`VisibilityObserver::closed`] waiters.
    closed_tx: watch::Sender<bool>,
}

// ============================================================================
// VisibilityObserver
// ============================================================================

/// Watches a popup container and reports when it becomes hidden.
///
/// Cloning yields another handle to the same observer.
#[derive(Clone)]
pub struct VisibilityObserver {
    inner: Arc<ObserverInner>,
}

impl fmt::Debug for VisibilityObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisibilityObserver")
            .field("node", &self.inner.node)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl VisibilityObserver {
    /// Starts observing `element`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn attach(element: &Element, on_close: Option<CloseHandler>) -> Self {
        let subscription = element
            .document()
            .observe_attribute(element.node(), STYLE_ATTRIBUTE);

        let (closed_tx, _rx) = watch::channel(false);
        let observer = Self {
            inner: Arc::new(ObserverInner {
                node: element.node(),
                fired: AtomicBool::new(false),
                closed_tx,
            }),
        };

        debug!(node = %element.node(), "Visibility observer attached");

        tokio::spawn(Self::run(
            Arc::clone(&observer.inner),
            element.clone(),
            subscription,
            on_close,
        ));

        observer
    }

    /// Returns the observed element.
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    /// Returns `true` once the popup has been seen hidden.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.fired.load(Ordering::Acquire)
    }

    /// Completes once the popup has closed and its handler has returned.
    pub async fn closed(&self) {
        let mut rx = self.inner.closed_tx.subscribe();
        // The sender lives in `inner`, so the channel cannot close here.
        let _ = rx.wait_for(|closed| *closed).await;
    }

    async fn run(
        inner: Arc<ObserverInner>,
        element: Element,
        mut subscription: AttributeSubscription,
        on_close: Option<CloseHandler>,
    ) {
        while let Some(batch) = subscription.next_batch().await {
            for mutation in batch {
                if mutation.attribute != STYLE_ATTRIBUTE || !element.is_display_none() {
                    continue;
                }
                if inner.fired.swap(true, Ordering::AcqRel) {
                    return;
                }

                subscription.disconnect();
                info!(node = %inner.node, "Popup hidden, firing close handler");

                if let Some(handler) = on_close {
                    handler();
                }
                inner.closed_tx.send_replace(true);
                return;
            }
        }

        debug!(node = %inner.node, "Style subscription ended before close");
    }
}

// ============================================================================
// Tests
// ============================================================================
