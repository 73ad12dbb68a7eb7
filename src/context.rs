//! Popup contexts and the context registry.
//!
//! Every loaded popup owns a [`Context`]: a bag of shared JSON properties
//! that can inherit from a parent context.
//!
//! - Reads check the context's own properties, then walk up the parent chain.
//! - Writes ([`Context::set`], [`Context::extend`]) only ever touch the
//!   context's own properties; parents are never mutated through a child.
//!
//! The [`ContextRegistry`] maps popup target ids to their current context.
//! Registering an id again replaces the previous context.
//!
//! # Example
//!
//! ```
//! use layer_popup::context::Context;
//! use serde_json::json;
//!
//! let parent = Context::new();
//! parent.set("theme", json!("dark"));
//!
//! let child = Context::with_parent(parent.clone());
//! child.extend([&json!({ "x": 1 })]).unwrap();
//!
//! assert_eq!(child.get("theme"), Some(json!("dark")));
//! assert_eq!(child.get("x"), Some(json!(1)));
//! assert_eq!(parent.get("x"), None);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::PopupId;

// ============================================================================
// Context
// ============================================================================

/// Internal shared state for a context.
struct ContextInner {
    /// Context reads fall back to.
    parent: Option<Context>,
    /// Own properties.
    local: RwLock<Map<String, Value>>,
}

/// Shared, inheritable popup state.
///
/// Cloning yields another handle to the same context.
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("own_keys", &self.own_keys())
            .field("has_parent", &self.inner.parent.is_some())
            .finish()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// Creates an empty context without a parent.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parent(None)
    }

    /// Creates an empty context inheriting from `parent`.
    #[must_use]
    pub fn with_parent(parent: Context) -> Self {
        Self::from_parent(Some(parent))
    }

    /// Creates an empty context with an optional parent.
    #[must_use]
    pub fn from_parent(parent: Option<Context>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                parent,
                local: RwLock::new(Map::new()),
            }),
        }
    }

    /// Returns the parent context, if any.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&Context> {
        self.inner.parent.as_ref()
    }

    /// Returns `true` if both handles refer to the same context.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

// ============================================================================
// Context - Reads
// ============================================================================

impl Context {
    /// Returns a property, falling back to the parent chain.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut current = Some(self);
        while let Some(context) = current {
            if let Some(value) = context.inner.local.read().get(key) {
                return Some(value.clone());
            }
            current = context.parent();
        }
        None
    }

    /// Returns an own property, ignoring the parent chain.
    #[must_use]
    pub fn get_own(&self, key: &str) -> Option<Value> {
        self.inner.local.read().get(key).cloned()
    }

    /// Deserializes a property (own or inherited) into `T`.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the stored value does not match `T`
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get(key)
            .map(serde_json::from_value)
            .transpose()
            .map_err(Error::from)
    }

    /// Returns `true` if the property exists on this context or a parent.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        let mut current = Some(self);
        while let Some(context) = current {
            if context.has_own(key) {
                return true;
            }
            current = context.parent();
        }
        false
    }

    /// Returns `true` if the property is an own property.
    #[inline]
    #[must_use]
    pub fn has_own(&self, key: &str) -> bool {
        self.inner.local.read().contains_key(key)
    }

    /// Returns the own property names.
    #[must_use]
    pub fn own_keys(&self) -> Vec<String> {
        self.inner.local.read().keys().cloned().collect()
    }

    /// Returns a snapshot of the own properties.
    #[must_use]
    pub fn own_properties(&self) -> Map<String, Value> {
        self.inner.local.read().clone()
    }
}

// ============================================================================
// Context - Writes
// ============================================================================

impl Context {
    /// Sets an own property, returning the previous own value.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.inner.local.write().insert(key.into(), value)
    }

    /// Serializes `value` and stores it as an own property.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if `value` cannot be serialized
    pub fn set_serialized<T: Serialize>(&self, key: impl Into<String>, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value);
        Ok(())
    }

    /// Removes an own property. Inherited properties are untouched.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.local.write().remove(key)
    }

    /// Merges the properties of each source object into this context's own
    /// properties, later sources winning. `null` sources are skipped.
    ///
    /// Returns `self` so calls can be chained.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if a source is neither an object nor
    ///   `null`; no source is applied in that case
    pub fn extend<'a, I>(&self, sources: I) -> Result<&Self>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let sources: Vec<&Map<String, Value>> = sources
            .into_iter()
            .filter(|source| !source.is_null())
            .map(|source| {
                source.as_object().ok_or_else(|| {
                    Error::invalid_argument(format!(
                        "context can only be extended with objects, got {source}"
                    ))
                })
            })
            .collect::<Result<_>>()?;

        let mut local = self.inner.local.write();
        for source in sources {
            for (key, value) in source {
                local.insert(key.clone(), value.clone());
            }
        }
        Ok(self)
    }

    /// Copies another context's own properties into this one.
    pub fn extend_from(&self, other: &Context) -> &Self {
        if self.ptr_eq(other) {
            return self;
        }
        let snapshot = other.own_properties();
        self.inner.local.write().extend(snapshot);
        self
    }
}

// ============================================================================
// ContextRegistry
// ============================================================================

/// Maps popup target ids to their current context.
///
/// Owned by a [`PopupManager`](crate::popup::PopupManager); entries live until
/// replaced by a later registration for the same id.
#[derive(Default)]
pub struct ContextRegistry {
    contexts: RwLock<FxHashMap<PopupId, Context>>,
}

impl fmt::Debug for ContextRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl ContextRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh context for `id`, replacing any previous one.
    pub fn register(&self, id: PopupId, parent: Option<Context>) -> Context {
        let context = Context::from_parent(parent);
        let replaced = self.contexts.write().insert(id.clone(), context.clone());
        debug!(
            target_id = %id,
            replaced = replaced.is_some(),
            inherits = context.parent().is_some(),
            "Context registered"
        );
        context
    }

    /// Returns the current context for `id`.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<Context> {
        self.contexts.read().get(id).cloned()
    }

    /// Returns `true` if `id` has a context.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.contexts.read().contains_key(id)
    }

    /// Returns the number of registered contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.read().len()
    }

    /// Returns `true` if no context is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.read().is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
