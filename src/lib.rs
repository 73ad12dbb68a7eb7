//! Layer popups - in-page popup lifecycle management.
//!
//! A layer popup is a container element inside the host document that is
//! shown to open the popup and hidden to close it. This library drives the
//! lifecycle of such popups:
//!
//! 1. **Open**: hand the request to a [`Launcher`] and register a fresh
//!    [`Context`] for the popup.
//! 2. **Ready**: poll until the container holds a focusable element.
//! 3. **Close**: observe the container and fire a close handler once it is
//!    hidden.
//!
//! The host document is abstracted behind the [`Document`] trait;
//! [`MemoryDocument`] is a deterministic in-memory implementation.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use layer_popup::{PopupManager, Result};
//! use layer_popup::dom::MemoryDocument;
//! use layer_popup::launcher::RecordingLauncher;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let document = Arc::new(MemoryDocument::new());
//!     let popups = PopupManager::builder()
//!         .document(document.clone())
//!         .launcher(Arc::new(RecordingLauncher::revealing(document)))
//!         .build()?;
//!
//!     let element = popups
//!         .opener("login", "/login.html")?
//!         .on_close(|| println!("login closed"))
//!         .load()
//!         .await?;
//!
//!     println!("login ready at {}", element.node());
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`context`] | Popup [`Context`] and [`ContextRegistry`] |
//! | [`dom`] | [`Document`] abstraction, [`Element`], [`MemoryDocument`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`focus`] | Focusability predicate and default readiness check |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`launcher`] | Open side effect |
//! | [`observer`] | [`VisibilityObserver`] |
//! | [`popup`] | [`PopupManager`], [`PopupOpener`] |
//! | [`wait`] | [`ConditionWaiter`] |

// ============================================================================
// Modules
// ============================================================================

/// Per-popup key/value contexts with inheritance.
pub mod context;

/// Host document abstraction.
///
/// - [`Document`] - Capability trait
/// - [`Element`] - Element handle
/// - [`MemoryDocument`] - In-memory document
pub mod dom;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Focusability rules.
pub mod focus;

/// Type-safe identifiers.
pub mod identifiers;

/// Popup open side effect.
pub mod launcher;

/// Popup dismissal detection.
pub mod observer;

/// Popup manager and openers.
///
/// Use [`PopupManager::builder()`] to create a configured manager.
pub mod popup;

/// Polling condition waiter.
pub mod wait;

// ============================================================================
// Re-exports
// ============================================================================

// Context types
pub use context::{Context, ContextRegistry};

// Document types
pub use dom::{Document, Element, MemoryDocument};

// Error types
pub use error::{Error, Result};

// Focus predicates
pub use focus::{is_focusable, popup_ready};

// Identifier types
pub use identifiers::{NodeId, PopupId};

// Launcher types
pub use launcher::{Launcher, OpenRequest};

// Observer types
pub use observer::VisibilityObserver;

// Popup types
pub use popup::{PopupManager, PopupManagerBuilder, PopupOpener, PopupOptions, PopupState};

// Wait types
pub use wait::{CancelHandle, ConditionWaiter};
