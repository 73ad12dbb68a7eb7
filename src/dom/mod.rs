//! Document environment module.
//!
//! Popups live inside a host document that this crate never renders itself.
//! The document is consumed as a capability through the [`Document`] trait:
//!
//! | Capability | Method |
//! |------------|--------|
//! | Element lookup by id | [`Document::element_by_id`] |
//! | Computed style query | [`Document::computed_style`] |
//! | Focusability inputs | [`Document::element_state`] |
//! | "Select all" descendants | [`Document::descendants`] |
//! | Attribute change subscription | [`Document::observe_attribute`] |
//!
//! [`MemoryDocument`] is a deterministic in-memory implementation used by
//! tests, benches and demos.
//!
//! # Example
//!
//! ```
//! use layer_popup::dom::{Document, MemoryDocument};
//!
//! let doc = MemoryDocument::new();
//! let layer = doc.create_element("div");
//! doc.set_id(layer, "layer");
//! doc.append_child(doc.body(), layer);
//!
//! assert_eq!(doc.element_by_id("layer"), Some(layer));
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Element handle and element state.
pub mod element;

/// In-memory document implementation.
pub mod memory;

/// Computed style types.
pub mod style;

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use tokio::sync::mpsc;

use crate::identifiers::NodeId;

// ============================================================================
// Re-exports
// ============================================================================

pub use element::{Element, ElementState};
pub use memory::MemoryDocument;
pub use style::{ComputedStyle, Display, Visibility};

// ============================================================================
// Constants
// ============================================================================

/// Name of the inline style attribute.
pub const STYLE_ATTRIBUTE: &str = "style";

// ============================================================================
// Document
// ============================================================================

/// The host document a popup is rendered into.
///
/// Implementations must be cheap to query; readiness predicates call into the
/// document on every poll tick.
pub trait Document: Send + Sync {
    /// Looks up an element by its `id` attribute.
    fn element_by_id(&self, id: &str) -> Option<NodeId>;

    /// Returns the computed style of an element.
    ///
    /// Returns `None` if the node is unknown to this document.
    fn computed_style(&self, node: NodeId) -> Option<ComputedStyle>;

    /// Returns the state consulted by the focusability check.
    ///
    /// Returns `None` if the node is unknown to this document.
    fn element_state(&self, node: NodeId) -> Option<ElementState>;

    /// Returns every descendant element of `node` in document order.
    fn descendants(&self, node: NodeId) -> Vec<NodeId>;

    /// Subscribes to changes of one attribute on one element.
    ///
    /// Changes are delivered in batches, one batch per document mutation.
    fn observe_attribute(&self, node: NodeId, attribute: &str) -> AttributeSubscription;
}

// ============================================================================
// AttributeMutation
// ============================================================================

/// A single observed attribute change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeMutation {
    /// Element whose attribute changed.
    pub node: NodeId,
    /// Name of the changed attribute.
    pub attribute: String,
    /// Attribute value before the change.
    pub old_value: Option<String>,
}

// ============================================================================
// AttributeSubscription
// ============================================================================

/// Receiving end of an attribute change subscription.
///
/// Dropping the subscription (or calling [`disconnect`](Self::disconnect))
/// stops delivery; the document prunes closed subscribers lazily.
pub struct AttributeSubscription {
    /// Element being observed.
    node: NodeId,
    /// Attribute being observed.
    attribute: String,
    /// Batches of mutations.
    rx: mpsc::UnboundedReceiver<Vec<AttributeMutation>>,
}

/// Sending end handed to the document.
pub type AttributeSender = mpsc::UnboundedSender<Vec<AttributeMutation>>;

impl fmt::Debug for AttributeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSubscription")
            .field("node", &self.node)
            .field("attribute", &self.attribute)
            .finish_non_exhaustive()
    }
}

impl AttributeSubscription {
    /// Creates a subscription together with the sender the document keeps.
    #[must_use]
    pub fn channel(node: NodeId, attribute: impl Into<String>) -> (AttributeSender, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = Self {
            node,
            attribute: attribute.into(),
            rx,
        };
        (tx, subscription)
    }

    /// Returns the observed element.
    #[inline]
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Returns the observed attribute name.
    #[inline]
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Waits for the next batch of mutations.
    ///
    /// Returns `None` once the document has dropped its sender.
    pub async fn next_batch(&mut self) -> Option<Vec<AttributeMutation>> {
        self.rx.recv().await
    }

    /// Stops receiving mutations.
    pub fn disconnect(mut self) {
        self.rx.close();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscription_receives_batches() {
        let node = NodeId::from_index(1);
        let (tx, mut sub) = AttributeSubscription::channel(node, STYLE_ATTRIBUTE);

        let mutation = AttributeMutation {
            node,
            attribute: STYLE_ATTRIBUTE.to_string(),
            old_value: None,
        };
        tx.send(vec![mutation.clone()]).expect("receiver alive");

        assert_eq!(sub.next_batch().await, Some(vec![mutation]));
        assert_eq!(sub.attribute(), "style");
        assert_eq!(sub.node(), node);
    }

    #[tokio::test]
    async fn test_subscription_ends_when_sender_dropped() {
        let (tx, mut sub) = AttributeSubscription::channel(NodeId::from_index(1), "style");
        drop(tx);
        assert_eq!(sub.next_batch().await, None);
    }

    #[test]
    fn test_disconnect_closes_sender() {
        let (tx, sub) = AttributeSubscription::channel(NodeId::from_index(1), "style");
        sub.disconnect();
        assert!(tx.is_closed());
    }
}
