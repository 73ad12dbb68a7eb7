//! Builder pattern for popup manager configuration.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use layer_popup::PopupManager;
//! use layer_popup::dom::MemoryDocument;
//! use layer_popup::launcher::RecordingLauncher;
//!
//! # fn example() -> layer_popup::Result<()> {
//! let popups = PopupManager::builder()
//!     .document(Arc::new(MemoryDocument::new()))
//!     .launcher(Arc::new(RecordingLauncher::new()))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::dom::Document;
use crate::error::{Error, Result};
use crate::launcher::Launcher;

use super::core::PopupManager;
use super::options::PopupOptions;

// ============================================================================
// PopupManagerBuilder
// ============================================================================

/// Builder for configuring a [`PopupManager`].
///
/// Use [`PopupManager::builder()`] to create a new builder.
#[derive(Default, Clone)]
pub struct PopupManagerBuilder {
    /// Host document.
    document: Option<Arc<dyn Document>>,
    /// Open side effect.
    launcher: Option<Arc<dyn Launcher>>,
    /// Timing options.
    options: PopupOptions,
}

impl fmt::Debug for PopupManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupManagerBuilder")
            .field("has_document", &self.document.is_some())
            .field("has_launcher", &self.launcher.is_some())
            .field("options", &self.options)
            .finish()
    }
}

// ============================================================================
// PopupManagerBuilder Implementation
// ============================================================================

impl PopupManagerBuilder {
    /// Creates a new builder with no collaborators and default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document popups are rendered into.
    ///
    /// # Arguments
    ///
    /// * `document` - Host document (e.g., `Arc::new(MemoryDocument::new())`)
    #[inline]
    #[must_use]
    pub fn document(mut self, document: Arc<dyn Document>) -> Self {
        self.document = Some(document);
        self
    }

    /// Sets the launcher that performs the open side effect.
    ///
    /// # Arguments
    ///
    /// * `launcher` - Receives an [`OpenRequest`](crate::launcher::OpenRequest) on every `load()`
    #[inline]
    #[must_use]
    pub fn launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Sets the timing options.
    ///
    /// # Arguments
    ///
    /// * `options` - Readiness timeout and poll interval
    #[inline]
    #[must_use]
    pub fn options(mut self, options: PopupOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds the manager.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the document or launcher is not set
    pub fn build(self) -> Result<PopupManager> {
        let document = self.document.ok_or_else(|| {
            Error::config(
                "Document is required. Use .document() to set it.\n\
                 Example: PopupManager::builder().document(Arc::new(MemoryDocument::new()))",
            )
        })?;

        let launcher = self.launcher.ok_or_else(|| {
            Error::config(
                "Launcher is required. Use .launcher() to set it.\n\
                 Example: PopupManager::builder().launcher(Arc::new(RecordingLauncher::new()))",
            )
        })?;

        Ok(PopupManager::new(document, launcher, self.options))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use crate::dom::MemoryDocument;
    use crate::launcher::RecordingLauncher;

    #[test]
    fn test_new_creates_empty_builder() {
        let builder = PopupManagerBuilder::new();
        assert!(builder.document.is_none());
        assert!(builder.launcher.is_none());
        assert_eq!(builder.options, PopupOptions::default());
    }

    #[test]
    fn test_build_fails_without_document() {
        let err = PopupManagerBuilder::new()
            .launcher(Arc::new(RecordingLauncher::new()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Document"));
    }

    #[test]
    fn test_build_fails_without_launcher() {
        let err = PopupManagerBuilder::new()
            .document(Arc::new(MemoryDocument::new()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Launcher"));
    }

    #[test]
    fn test_build_applies_options() {
        let options = PopupOptions::new().with_ready_timeout(Duration::from_millis(100));
        let manager = PopupManagerBuilder::new()
            .document(Arc::new(MemoryDocument::new()))
            .launcher(Arc::new(RecordingLauncher::new()))
            .options(options)
            .build()
            .expect("complete builder");

        assert_eq!(manager.options(), options);
    }

    #[test]
    fn test_builder_is_clone() {
        let builder = PopupManagerBuilder::new().document(Arc::new(MemoryDocument::new()));
        let cloned = builder.clone();
        assert!(cloned.document.is_some());
    }
}
