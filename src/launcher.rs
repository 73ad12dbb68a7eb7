//! Popup opening side effect.
//!
//! How a popup is actually rendered (fetching the URL, injecting markup,
//! positioning the layer) is outside this crate. [`PopupOpener::load`]
//! hands an [`OpenRequest`] to a [`Launcher`] and does not wait for it;
//! readiness is detected separately by polling the document.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Launcher`] | The side-effect trait |
//! | [`FnLauncher`] | Adapts a closure |
//! | [`RecordingLauncher`] | Mock launcher that records requests and can reveal the target |
//!
//! [`PopupOpener::load`]: crate::popup::PopupOpener::load

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use crate::dom::{Document, MemoryDocument};
use crate::identifiers::PopupId;

// ============================================================================
// Types
// ============================================================================

/// Opaque callback passed through to the launcher.
pub type OpenCallback = Arc<dyn Fn(Value) + Send + Sync>;

// ============================================================================
// OpenRequest
// ============================================================================

/// Everything a launcher receives when a popup is loaded.
///
/// `data`, `callback`, `p` and `t` are opaque to this crate.
#[derive(Clone)]
pub struct OpenRequest {
    /// Target container id.
    pub target_id: PopupId,
    /// Content URL.
    pub url: String,
    /// Payload data.
    pub data: Value,
    /// Caller callback.
    pub callback: Option<OpenCallback>,
    /// Positioning parameter.
    pub p: Value,
    /// Timing parameter.
    pub t: Value,
}

impl fmt::Debug for OpenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRequest")
            .field("target_id", &self.target_id)
            .field("url", &self.url)
            .field("data", &self.data)
            .field("has_callback", &self.callback.is_some())
            .field("p", &self.p)
            .field("t", &self.t)
            .finish()
    }
}

// ============================================================================
// Launcher
// ============================================================================

/// Renders a popup into the document.
///
/// Called synchronously from `load()`; implementations that need to do
/// asynchronous work should spawn it and return.
pub trait Launcher: Send + Sync {
    /// Starts opening the popup described by `request`.
    fn open(&self, request: &OpenRequest);
}

// ============================================================================
// FnLauncher
// ============================================================================

/// A [`Launcher`] backed by a closure.
pub struct FnLauncher<F> {
    f: F,
}

impl<F> FnLauncher<F>
where
    F: Fn(&OpenRequest) + Send + Sync,
{
    /// Wraps `f`.
    #[must_use]
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnLauncher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnLauncher").finish_non_exhaustive()
    }
}

impl<F> Launcher for FnLauncher<F>
where
    F: Fn(&OpenRequest) + Send + Sync,
{
    fn open(&self, request: &OpenRequest) {
        (self.f)(request);
    }
}

// ============================================================================
// RecordingLauncher
// ============================================================================

/// Mock launcher.
///
/// Records every request. When built with [`revealing`](Self::revealing), it
/// also clears `display` on the target element, standing in for a real
/// renderer that shows a pre-rendered, hidden layer.
#[derive(Default)]
pub struct RecordingLauncher {
    /// Requests in call order.
    requests: Mutex<Vec<OpenRequest>>,
    /// Document whose target element is revealed on open.
    document: Option<Arc<MemoryDocument>>,
}

impl fmt::Debug for RecordingLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingLauncher")
            .field("request_count", &self.request_count())
            .field("reveals", &self.document.is_some())
            .finish()
    }
}

impl RecordingLauncher {
    /// Creates a launcher that only records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a launcher that records and reveals the target in `document`.
    #[must_use]
    pub fn revealing(document: Arc<MemoryDocument>) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            document: Some(document),
        }
    }

    /// Returns the recorded requests.
    #[must_use]
    pub fn requests(&self) -> Vec<OpenRequest> {
        self.requests.lock().clone()
    }

    /// Returns the number of recorded requests.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Launcher for RecordingLauncher {
    fn open(&self, request: &OpenRequest) {
        debug!(target_id = %request.target_id, url = %request.url, "Recording open request");
        self.requests.lock().push(request.clone());

        if let Some(document) = &self.document
            && let Some(node) = document.element_by_id(request.target_id.as_str())
        {
            document.remove_style(node, "display");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
