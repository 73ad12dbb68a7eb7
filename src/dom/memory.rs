//! In-memory document.
//!
//! [`MemoryDocument`] is a small arena-backed element tree implementing
//! [`Document`]. It models exactly what popups consume: ids, inline styles,
//! focusability attributes and attribute change notifications.
//!
//! Every mutator emits one batch of [`AttributeMutation`]s to the matching
//! subscribers once the tree lock is released.
//!
//! # Example
//!
//! ```
//! use layer_popup::dom::{Document, MemoryDocument};
//!
//! let doc = MemoryDocument::new();
//! let layer = doc.create_element("div");
//! let button = doc.create_element("button");
//! doc.set_id(layer, "layer");
//! doc.append_child(doc.body(), layer);
//! doc.append_child(layer, button);
//!
//! doc.set_style(layer, "display", "none");
//! assert!(doc.computed_style(layer).unwrap().display.is_none());
//! assert_eq!(doc.style_attribute(layer).as_deref(), Some("display: none"));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use parking_lot::{Mutex, RwLock};
use tracing::{trace, warn};

use crate::identifiers::NodeId;

use super::{
    AttributeMutation, AttributeSender, AttributeSubscription, ComputedStyle, Display, Document,
    ElementState, STYLE_ATTRIBUTE, Visibility,
};

// ============================================================================
// Types
// ============================================================================

/// One element of the tree.
#[derive(Debug, Clone)]
struct Node {
    /// Lowercase tag name.
    tag: String,
    /// `id` attribute.
    id: Option<String>,
    /// Parent element.
    parent: Option<NodeId>,
    /// Children in document order.
    children: Vec<NodeId>,
    /// Inline style declarations in insertion order.
    style: Vec<(String, String)>,
    /// `disabled` attribute.
    disabled: bool,
    /// `hidden` attribute.
    hidden: bool,
    /// `tabindex` attribute.
    tab_index: Option<i32>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            id: None,
            parent: None,
            children: Vec::new(),
            style: Vec::new(),
            disabled: false,
            hidden: false,
            tab_index: None,
        }
    }

    /// Serialized `style` attribute, `None` when no declarations are set.
    fn style_text(&self) -> Option<String> {
        if self.style.is_empty() {
            return None;
        }
        let text = self
            .style
            .iter()
            .map(|(property, value)| format!("{property}: {value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(text)
    }

    fn style_value(&self, property: &str) -> Option<&str> {
        self.style
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.as_str())
    }
}

/// A registered attribute subscriber.
struct Watcher {
    node: NodeId,
    attribute: String,
    tx: AttributeSender,
}

// ============================================================================
// MemoryDocument
// ============================================================================

/// Deterministic in-memory [`Document`].
///
/// Node `0` is the `body` element; only elements connected to it are found by
/// [`Document::element_by_id`].
pub struct MemoryDocument {
    /// Element arena.
    nodes: RwLock<Vec<Node>>,
    /// Attribute subscribers.
    watchers: Mutex<Vec<Watcher>>,
}

impl fmt::Debug for MemoryDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDocument")
            .field("node_count", &self.node_count())
            .field("watcher_count", &self.watchers.lock().len())
            .finish()
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Creates a document containing only an empty `body`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(vec![Node::new("body")]),
            watchers: Mutex::new(Vec::new()),
        }
    }

    /// Returns the `body` element.
    #[inline]
    #[must_use]
    pub const fn body(&self) -> NodeId {
        NodeId::from_index(0)
    }

    /// Returns the number of elements, connected or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.read().len()
    }
}

// ============================================================================
// MemoryDocument - Tree Construction
// ============================================================================

impl MemoryDocument {
    /// Creates a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        let mut nodes = self.nodes.write();
        let index = u32::try_from(nodes.len()).unwrap_or(u32::MAX);
        nodes.push(Node::new(tag));
        NodeId::from_index(index)
    }

    /// Appends `child` to `parent`, detaching it from any previous parent.
    ///
    /// Ignored if it would make an element its own ancestor.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        let mut nodes = self.nodes.write();
        if !Self::contains(&nodes, parent) || !Self::contains(&nodes, child) {
            warn!(%parent, %child, "append_child on unknown node");
            return;
        }
        if Self::is_inclusive_ancestor(&nodes, child, parent) {
            warn!(%parent, %child, "append_child would create a cycle");
            return;
        }

        Self::unlink(&mut nodes, child);
        nodes[Self::slot(child)].parent = Some(parent);
        nodes[Self::slot(parent)].children.push(child);
    }

    /// Detaches `node` (and its subtree) from its parent.
    pub fn detach(&self, node: NodeId) {
        let mut nodes = self.nodes.write();
        if Self::contains(&nodes, node) {
            Self::unlink(&mut nodes, node);
        }
    }

    /// Returns `true` if `node` is connected to the `body`.
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        let nodes = self.nodes.read();
        Self::contains(&nodes, node) && Self::is_inclusive_ancestor(&nodes, self.body(), node)
    }
}

// ============================================================================
// MemoryDocument - Attribute Mutators
// ============================================================================

impl MemoryDocument {
    /// Sets the `id` attribute.
    pub fn set_id(&self, node: NodeId, id: &str) {
        self.mutate(node, |n| {
            let old = n.id.replace(id.to_string());
            vec![("id", old)]
        });
    }

    /// Sets one inline style declaration.
    pub fn set_style(&self, node: NodeId, property: &str, value: &str) {
        self.set_styles(node, &[(property, value)]);
    }

    /// Sets several inline style declarations, delivered as one batch with one
    /// `style` mutation per declaration.
    pub fn set_styles(&self, node: NodeId, declarations: &[(&str, &str)]) {
        self.mutate(node, |n| {
            declarations
                .iter()
                .map(|(property, value)| {
                    let old = n.style_text();
                    let property = property.trim().to_ascii_lowercase();
                    let value = value.trim().to_string();
                    match n.style.iter_mut().find(|(name, _)| *name == property) {
                        Some(slot) => slot.1 = value,
                        None => n.style.push((property, value)),
                    }
                    (STYLE_ATTRIBUTE, old)
                })
                .collect()
        });
    }

    /// Replaces the whole `style` attribute with `text`
    /// (`"display: none; color: red"`).
    pub fn set_style_text(&self, node: NodeId, text: &str) {
        let declarations: Vec<(String, String)> = text
            .split(';')
            .filter_map(|declaration| {
                let (property, value) = declaration.split_once(':')?;
                let property = property.trim().to_ascii_lowercase();
                let value = value.trim().to_string();
                (!property.is_empty() && !value.is_empty()).then_some((property, value))
            })
            .collect();

        self.mutate(node, |n| {
            let old = n.style_text();
            n.style = declarations;
            vec![(STYLE_ATTRIBUTE, old)]
        });
    }

    /// Removes one inline style declaration.
    pub fn remove_style(&self, node: NodeId, property: &str) {
        let property = property.trim().to_ascii_lowercase();
        self.mutate(node, |n| {
            let old = n.style_text();
            let before = n.style.len();
            n.style.retain(|(name, _)| *name != property);
            if n.style.len() == before {
                return Vec::new();
            }
            vec![(STYLE_ATTRIBUTE, old)]
        });
    }

    /// Sets or clears the `disabled` attribute.
    pub fn set_disabled(&self, node: NodeId, disabled: bool) {
        self.mutate(node, |n| {
            let old = std::mem::replace(&mut n.disabled, disabled);
            vec![("disabled", old.then(String::new))]
        });
    }

    /// Sets or clears the `hidden` attribute.
    pub fn set_hidden(&self, node: NodeId, hidden: bool) {
        self.mutate(node, |n| {
            let old = std::mem::replace(&mut n.hidden, hidden);
            vec![("hidden", old.then(String::new))]
        });
    }

    /// Sets or clears the `tabindex` attribute.
    pub fn set_tab_index(&self, node: NodeId, tab_index: Option<i32>) {
        self.mutate(node, |n| {
            let old = std::mem::replace(&mut n.tab_index, tab_index);
            vec![("tabindex", old.map(|v| v.to_string()))]
        });
    }

    /// Returns the serialized `style` attribute.
    #[must_use]
    pub fn style_attribute(&self, node: NodeId) -> Option<String> {
        let nodes = self.nodes.read();
        nodes.get(Self::slot(node)).and_then(Node::style_text)
    }

    /// Returns the number of live attribute subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut watchers = self.watchers.lock();
        watchers.retain(|w| !w.tx.is_closed());
        watchers.len()
    }
}

// ============================================================================
// MemoryDocument - Internal
// ============================================================================

impl MemoryDocument {
    #[inline]
    fn slot(node: NodeId) -> usize {
        node.index() as usize
    }

    #[inline]
    fn contains(nodes: &[Node], node: NodeId) -> bool {
        Self::slot(node) < nodes.len()
    }

    /// Returns `true` if `ancestor` is `node` or one of its ancestors.
    fn is_inclusive_ancestor(nodes: &[Node], ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = nodes[Self::slot(id)].parent;
        }
        false
    }

    fn unlink(nodes: &mut [Node], node: NodeId) {
        if let Some(parent) = nodes[Self::slot(node)].parent.take() {
            nodes[Self::slot(parent)].children.retain(|c| *c != node);
        }
    }

    /// Applies `change` to `node` and notifies subscribers.
    ///
    /// `change` returns `(attribute, old_value)` for each mutation it made.
    fn mutate<F>(&self, node: NodeId, change: F)
    where
        F: FnOnce(&mut Node) -> Vec<(&'static str, Option<String>)>,
    {
        let records = {
            let mut nodes = self.nodes.write();
            let Some(target) = nodes.get_mut(Self::slot(node)) else {
                warn!(%node, "Attribute mutation on unknown node");
                return;
            };
            change(target)
        };

        if records.is_empty() {
            return;
        }

        let mut watchers = self.watchers.lock();
        watchers.retain(|w| !w.tx.is_closed());

        for watcher in watchers.iter().filter(|w| w.node == node) {
            let batch: Vec<AttributeMutation> = records
                .iter()
                .filter(|(attribute, _)| *attribute == watcher.attribute)
                .map(|(attribute, old_value)| AttributeMutation {
                    node,
                    attribute: (*attribute).to_string(),
                    old_value: old_value.clone(),
                })
                .collect();

            if batch.is_empty() {
                continue;
            }

            trace!(%node, attribute = %watcher.attribute, mutations = batch.len(), "Delivering mutation batch");
            let _ = watcher.tx.send(batch);
        }
    }
}

// ============================================================================
// Document Implementation
// ============================================================================

impl Document for MemoryDocument {
    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        let nodes = self.nodes.read();
        let mut stack = vec![self.body()];
        while let Some(current) = stack.pop() {
            let node = &nodes[Self::slot(current)];
            if node.id.as_deref() == Some(id) {
                return Some(current);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    fn computed_style(&self, node: NodeId) -> Option<ComputedStyle> {
        let nodes = self.nodes.read();
        let element = nodes.get(Self::slot(node))?;

        let display = element
            .style_value("display")
            .and_then(|v| v.parse::<Display>().ok())
            .unwrap_or_default();

        // `visibility` inherits; `display` does not.
        let mut visibility = Visibility::default();
        let mut current = Some(node);
        while let Some(id) = current {
            let n = &nodes[Self::slot(id)];
            if let Some(value) = n.style_value("visibility").and_then(|v| v.parse().ok()) {
                visibility = value;
                break;
            }
            current = n.parent;
        }

        Some(ComputedStyle {
            display,
            visibility,
        })
    }

    fn element_state(&self, node: NodeId) -> Option<ElementState> {
        let nodes = self.nodes.read();
        let n = nodes.get(Self::slot(node))?;
        Some(ElementState {
            tag: n.tag.clone(),
            disabled: n.disabled,
            hidden: n.hidden,
            tab_index: n.tab_index,
        })
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let nodes = self.nodes.read();
        let Some(root) = nodes.get(Self::slot(node)) else {
            return Vec::new();
        };

        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = root.children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(nodes[Self::slot(current)].children.iter().rev().copied());
        }
        out
    }

    fn observe_attribute(&self, node: NodeId, attribute: &str) -> AttributeSubscription {
        let (tx, subscription) = AttributeSubscription::channel(node, attribute);
        self.watchers.lock().push(Watcher {
            node,
            attribute: attribute.to_string(),
            tx,
        });
        subscription
    }
}

// ============================================================================
// Tests
// ============================================================================
