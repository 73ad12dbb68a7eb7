//! Popup manager: the capability object popups are opened through.
//!
//! A [`PopupManager`] owns the collaborators (document, launcher), the timing
//! options and the [`ContextRegistry`]. Registries are per manager, so
//! independent managers (and tests) never share popup contexts.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use layer_popup::PopupManager;
//! use layer_popup::dom::MemoryDocument;
//! use layer_popup::launcher::RecordingLauncher;
//!
//! # async fn example() -> layer_popup::Result<()> {
//! let popups = PopupManager::builder()
//!     .document(Arc::new(MemoryDocument::new()))
//!     .launcher(Arc::new(RecordingLauncher::new()))
//!     .build()?;
//!
//! let element = popups.opener("login", "/login.html")?.load().await?;
//! let context = popups.get_context("login").expect("registered by load");
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::context::{Context, ContextRegistry};
use crate::dom::Document;
use crate::error::{Error, Result};
use crate::identifiers::PopupId;
use crate::launcher::Launcher;

use super::builder::PopupManagerBuilder;
use super::opener::PopupOpener;
use super::options::PopupOptions;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the manager.
pub(crate) struct ManagerInner {
    /// Host document.
    pub document: Arc<dyn Document>,
    /// Open side effect.
    pub launcher: Arc<dyn Launcher>,
    /// Timing options.
    pub options: PopupOptions,
    /// Contexts by target id.
    pub registry: ContextRegistry,
}

// ============================================================================
// PopupManager
// ============================================================================

/// Factory for popup openers and owner of their contexts.
#[derive(Clone)]
pub struct PopupManager {
    /// Shared inner state.
    pub(crate) inner: Arc<ManagerInner>,
}

impl fmt::Debug for PopupManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupManager")
            .field("options", &self.inner.options)
            .field("context_count", &self.inner.registry.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// PopupManager - Public API
// ============================================================================

impl PopupManager {
    /// Creates a configuration builder for the manager.
    #[inline]
    #[must_use]
    pub fn builder() -> PopupManagerBuilder {
        PopupManagerBuilder::new()
    }

    /// Creates an opener for the popup rendered into `target_id` from `url`.
    ///
    /// # Errors
    ///
    /// - [`Error::Construction`] if `target_id` or `url` is empty
    pub fn opener(
        &self,
        target_id: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<PopupOpener> {
        let target_id = PopupId::new(target_id)
            .ok_or_else(|| Error::construction("popup target id is required"))?;

        let url = url.into();
        if url.is_empty() {
            return Err(Error::construction("popup url is required"));
        }

        debug!(target_id = %target_id, url = %url, "Opener created");
        Ok(PopupOpener::new(Arc::clone(&self.inner), target_id, url))
    }

    /// Returns the current context of the popup with `id`.
    #[inline]
    #[must_use]
    pub fn get_context(&self, id: &str) -> Option<Context> {
        self.inner.registry.lookup(id)
    }

    /// Returns the context registry.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &ContextRegistry {
        &self.inner.registry
    }

    /// Returns the timing options.
    #[inline]
    #[must_use]
    pub fn options(&self) -> PopupOptions {
        self.inner.options
    }

    /// Returns the host document.
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Arc<dyn Document> {
        &self.inner.document
    }
}

// ============================================================================
// PopupManager - Internal API
// ============================================================================

impl PopupManager {
    /// Creates a new manager.
    pub(crate) fn new(
        document: Arc<dyn Document>,
        launcher: Arc<dyn Launcher>,
        options: PopupOptions,
    ) -> Self {
        debug!(
            ready_timeout_ms = options.ready_timeout.as_millis() as u64,
            poll_interval_ms = options.poll_interval.as_millis() as u64,
            "Popup manager initialized"
        );

        Self {
            inner: Arc::new(ManagerInner {
                document,
                launcher,
                options,
                registry: ContextRegistry::new(),
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
