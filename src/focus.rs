//! Focusability checks.
//!
//! A popup counts as usable once its container holds at least one element a
//! user could interact with. [`is_focusable`] classifies a single element;
//! [`popup_ready`] is the default readiness predicate built on top of it.
//!
//! # Rules
//!
//! Evaluated in order, the first decisive rule wins:
//!
//! | # | Condition | Result |
//! |---|-----------|--------|
//! | 1 | element absent or unknown to the document | not focusable |
//! | 2 | `display: none` or `visibility: hidden` | not focusable |
//! | 3 | `disabled` | not focusable |
//! | 4 | `hidden` attribute | not focusable |
//! | 5 | explicit `tabindex` < 0 | not focusable |
//! | 6 | tag is `a`, `button`, `input`, `textarea`, `select` or `details` | focusable |
//! | 7 | otherwise | focusable iff explicit `tabindex` >= 0 |

use crate::dom::{ComputedStyle, Document, Element, ElementState};

// ============================================================================
// Constants
// ============================================================================

/// Tags that are interactive without an explicit `tabindex`.
const INTERACTIVE_TAGS: &[&str] = &["a", "button", "input", "textarea", "select", "details"];

// ============================================================================
// Predicates
// ============================================================================

/// Returns `true` if `element` could receive focus.
#[must_use]
pub fn is_focusable(element: Option<&Element>) -> bool {
    element.is_some_and(|el| classify(el.computed_style(), el.state()))
}

/// Default readiness predicate for a popup.
///
/// True iff the document has an element with `target_id` and at least one of
/// its descendants is focusable.
#[must_use]
pub fn popup_ready(document: &dyn Document, target_id: &str) -> bool {
    let Some(container) = document.element_by_id(target_id) else {
        return false;
    };

    document
        .descendants(container)
        .into_iter()
        .any(|node| classify(document.computed_style(node), document.element_state(node)))
}

/// Applies rules 2-7; a missing style or state means the node is unknown.
fn classify(style: Option<ComputedStyle>, state: Option<ElementState>) -> bool {
    let (Some(style), Some(state)) = (style, state) else {
        return false;
    };

    if !style.is_rendered_visible() {
        return false;
    }
    if state.disabled || state.hidden {
        return false;
    }
    if state.tab_index.is_some_and(|index| index < 0) {
        return false;
    }
    if INTERACTIVE_TAGS
        .iter()
        .any(|tag| state.tag.eq_ignore_ascii_case(tag))
    {
        return true;
    }

    state.tab_index.is_some_and(|index| index >= 0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use proptest::prelude::*;

    use crate::dom::MemoryDocument;
    use crate::identifiers::NodeId;

    fn element(doc: &Arc<MemoryDocument>, tag: &str) -> (NodeId, Element) {
        let node = doc.create_element(tag);
        doc.append_child(doc.body(), node);
        (node, Element::new(node, doc.clone()))
    }

    #[test]
    fn test_absent_element() {
        assert!(!is_focusable(None));
    }

    #[test]
    fn test_unknown_node_is_absent() {
        let doc = Arc::new(MemoryDocument::new());
        let ghost = Element::new(NodeId::from_index(42), doc);
        assert!(!is_focusable(Some(&ghost)));
    }

    #[test]
    fn test_detached_node_keeps_its_state() {
        let doc = Arc::new(MemoryDocument::new());
        let (node, el) = element(&doc, "button");
        doc.detach(node);

        assert!(!doc.is_connected(node));
        assert!(is_focusable(Some(&el)));
    }

    #[test]
    fn test_interactive_tags() {
        let doc = Arc::new(MemoryDocument::new());
        for tag in ["a", "BUTTON", "input", "textarea", "select", "details"] {
            let (_, el) = element(&doc, tag);
            assert!(is_focusable(Some(&el)), "{tag} should be focusable");
        }
    }

    #[test]
    fn test_plain_element_needs_tab_index() {
        let doc = Arc::new(MemoryDocument::new());
        let (node, el) = element(&doc, "div");
        assert!(!is_focusable(Some(&el)));

        doc.set_tab_index(node, Some(0));
        assert!(is_focusable(Some(&el)));
    }

    #[test]
    fn test_display_none_and_visibility_hidden() {
        let doc = Arc::new(MemoryDocument::new());
        let (node, el) = element(&doc, "button");

        doc.set_style(node, "display", "none");
        assert!(!is_focusable(Some(&el)));

        doc.remove_style(node, "display");
        doc.set_style(node, "visibility", "hidden");
        assert!(!is_focusable(Some(&el)));
    }

    #[test]
    fn test_disabled_and_hidden_attribute() {
        let doc = Arc::new(MemoryDocument::new());
        let (node, el) = element(&doc, "input");

        doc.set_disabled(node, true);
        assert!(!is_focusable(Some(&el)));

        doc.set_disabled(node, false);
        doc.set_hidden(node, true);
        assert!(!is_focusable(Some(&el)));
    }

    #[test]
    fn test_negative_tab_index_beats_interactive_tag() {
        let doc = Arc::new(MemoryDocument::new());
        let (node, el) = element(&doc, "button");
        doc.set_tab_index(node, Some(-1));
        assert!(!is_focusable(Some(&el)));
    }

    #[test]
    fn test_popup_ready() {
        let doc = MemoryDocument::new();
        assert!(!popup_ready(&doc, "layer"));

        let layer = doc.create_element("div");
        doc.set_id(layer, "layer");
        doc.append_child(doc.body(), layer);
        assert!(!popup_ready(&doc, "layer"));

        let text = doc.create_element("p");
        doc.append_child(layer, text);
        assert!(!popup_ready(&doc, "layer"));

        let button = doc.create_element("button");
        doc.append_child(text, button);
        assert!(popup_ready(&doc, "layer"));

        doc.set_disabled(button, true);
        assert!(!popup_ready(&doc, "layer"));
    }

    #[test]
    fn test_popup_ready_ignores_container_itself() {
        let doc = MemoryDocument::new();
        let layer = doc.create_element("button");
        doc.set_id(layer, "layer");
        doc.append_child(doc.body(), layer);
        assert!(!popup_ready(&doc, "layer"));
    }

    proptest! {
        #[test]
        fn prop_visible_interactive_tag_without_tab_index_is_focusable(
            tag in prop::sample::select(vec!["a", "button", "input", "textarea", "select", "details"]),
            upper in any::<bool>(),
        ) {
            let doc = Arc::new(MemoryDocument::new());
            let tag = if upper { tag.to_ascii_uppercase() } else { tag.to_string() };
            let (_, el) = element(&doc, &tag);
            prop_assert!(is_focusable(Some(&el)));
        }

        #[test]
        fn prop_disabled_never_focusable(
            tag in "[a-z]{1,8}",
            tab_index in prop::option::of(-3i32..3),
        ) {
            let doc = Arc::new(MemoryDocument::new());
            let (node, el) = element(&doc, &tag);
            doc.set_tab_index(node, tab_index);
            doc.set_disabled(node, true);
            prop_assert!(!is_focusable(Some(&el)));
        }
    }
}
