//! Element handles.
//!
//! An [`Element`] pairs a [`NodeId`] with the [`Document`] that issued it, so
//! callers (and popup `on_load` handlers) can query it without threading the
//! document around.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::identifiers::NodeId;

use super::{ComputedStyle, Document};

// ============================================================================
// ElementState
// ============================================================================

/// Element properties consulted by the focusability check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementState {
    /// Lowercase tag name.
    pub tag: String,
    /// `disabled` attribute present.
    pub disabled: bool,
    /// `hidden` attribute present.
    pub hidden: bool,
    /// Explicit `tabindex`, if any.
    pub tab_index: Option<i32>,
}

impl ElementState {
    /// Creates the state of a plain element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Element
// ============================================================================

/// A handle to an element of a [`Document`].
#[derive(Clone)]
pub struct Element {
    /// Node inside the document.
    node: NodeId,
    /// Owning document.
    document: Arc<dyn Document>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("node", &self.node)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node && Arc::ptr_eq(&self.document, &other.document)
    }
}

impl Eq for Element {}

impl Element {
    /// Creates a new element handle.
    #[inline]
    #[must_use]
    pub fn new(node: NodeId, document: Arc<dyn Document>) -> Self {
        Self { node, document }
    }

    /// Looks up an element by id in `document`.
    #[must_use]
    pub fn by_id(document: &Arc<dyn Document>, id: &str) -> Option<Self> {
        document
            .element_by_id(id)
            .map(|node| Self::new(node, Arc::clone(document)))
    }
}

// ============================================================================
// Element - Accessors
// ============================================================================

impl Element {
    /// Returns the node id.
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Returns the owning document.
    #[inline]
    #[must_use]
    pub fn document(&self) -> &Arc<dyn Document> {
        &self.document
    }

    /// Returns the computed style, or `None` if the node is gone.
    #[inline]
    #[must_use]
    pub fn computed_style(&self) -> Option<ComputedStyle> {
        self.document.computed_style(self.node)
    }

    /// Returns the focusability state, or `None` if the node is gone.
    #[inline]
    #[must_use]
    pub fn state(&self) -> Option<ElementState> {
        self.document.element_state(self.node)
    }

    /// Returns `true` if the computed display is `none`.
    ///
    /// A node the document no longer knows counts as not displayed.
    #[must_use]
    pub fn is_display_none(&self) -> bool {
        self.computed_style()
            .is_none_or(|style| style.display.is_none())
    }

    /// Returns handles to every descendant element in document order.
    #[must_use]
    pub fn descendants(&self) -> Vec<Element> {
        self.document
            .descendants(self.node)
            .into_iter()
            .map(|node| Self::new(node, Arc::clone(&self.document)))
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
