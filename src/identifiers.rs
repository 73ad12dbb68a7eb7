//! Type-safe identifiers for popups and document nodes.
//!
//! Newtype wrappers prevent mixing a popup's target id with arbitrary
//! strings, and document node handles with plain integers.

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Borrow;
use std::fmt;
use std::result::Result as StdResult;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

// ============================================================================
// PopupId
// ============================================================================

/// Identifier of a popup's target container element.
///
/// Never empty. Cloning is cheap (shared string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopupId(Arc<str>);

impl PopupId {
    /// Creates a popup id.
    ///
    /// Returns `None` if `id` is empty.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            return None;
        }
        Some(Self(Arc::from(id)))
    }

    /// Returns the id as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PopupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for PopupId {
    fn serialize<S: Serializer>(&self, serializer: S) -> StdResult<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl AsRef<str> for PopupId {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PopupId {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// NodeId
// ============================================================================

/// Handle to an element inside a [`Document`](crate::dom::Document).
///
/// Only meaningful for the document that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates a node id from its raw index.
    #[inline]
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
