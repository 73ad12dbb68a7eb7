//! Popup manager, openers and lifecycle.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PopupManager`] | Owns the document, launcher, options and context registry |
//! | [`PopupManagerBuilder`] | Builds a manager |
//! | [`PopupOptions`] | Readiness timeout and poll interval |
//! | [`PopupOpener`] | One open request and its `load()` lifecycle |
//! | [`PopupState`] | Lifecycle state of an opener |

// ============================================================================
// Submodules
// ============================================================================

/// Manager builder.
pub mod builder;

/// Manager implementation.
pub mod core;

/// Process-wide manager slot.
pub mod global;

/// Opener and lifecycle.
pub mod opener;

/// Timing options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::PopupManagerBuilder;
pub use core::PopupManager;
pub use opener::{LoadHandler, PopupOpener, PopupState, ReadyPredicate};
pub use options::PopupOptions;
