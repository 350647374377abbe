//! Layout registry and forward references for self-referential structures.
//!
//! A layout whose fields point at the layout itself (linked-list nodes, tree
//! nodes) cannot hand `build` a finished `Arc` of itself. The registry breaks
//! the knot: [`LayoutRegistry::forward`] mints a [`LazyRef`] naming the
//! layout, the builder embeds that, and the name is resolved against the
//! registry on first access, after registration has happened.
//!
//! The registry is a concurrent name map and is shared behind `Arc`.
//! [`LazyRef`] holds it weakly; a strong reference would form a cycle the
//! moment the registry owns a layout that references back into it. Resolution
//! caches the layout, so the registry is consulted at most once per
//! reference.

use std::{
    fmt,
    sync::{Arc, OnceLock, Weak},
};

use dashmap::{mapref::entry::Entry, DashMap};

use crate::{overlay::StructLayout, Error, Result};

/// Concurrent name-to-layout map backing forward references.
///
/// # Examples
///
/// ```rust
/// use memscope::overlay::{FieldDescriptor, LayoutRegistry, ScalarKind, StructLayout};
///
/// # fn main() -> memscope::Result<()> {
/// let registry = LayoutRegistry::new();
///
/// let node = StructLayout::builder("Node")
///     .scalar("value", 0x00, ScalarKind::I64)
///     .pointer("next", 0x08, FieldDescriptor::Lazy(registry.forward("Node")))
///     .build()?;
/// registry.register(node)?;
///
/// assert!(registry.get("Node").is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LayoutRegistry {
    layouts: DashMap<Arc<str>, Arc<StructLayout>>,
}

impl LayoutRegistry {
    /// Creates an empty registry.
    ///
    /// Returned behind `Arc` because forward references need a handle they
    /// can hold weakly.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(LayoutRegistry {
            layouts: DashMap::new(),
        })
    }

    /// Registers a layout under its own name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateLayout`] when the name is already taken.
    pub fn register(&self, layout: Arc<StructLayout>) -> Result<()> {
        match self.layouts.entry(Arc::from(layout.name())) {
            Entry::Occupied(_) => Err(Error::DuplicateLayout(layout.name().to_string())),
            Entry::Vacant(entry) => {
                entry.insert(layout);
                Ok(())
            }
        }
    }

    /// Looks up a registered layout by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<StructLayout>> {
        self.layouts.get(name).map(|entry| entry.value().clone())
    }

    /// Number of registered layouts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Mints a forward reference to `name`.
    ///
    /// The name does not have to be registered yet; that is the point.
    /// Resolution happens on first access through the returned [`LazyRef`].
    #[must_use]
    pub fn forward(self: &Arc<Self>, name: &str) -> LazyRef {
        LazyRef {
            name: Arc::from(name),
            registry: Arc::downgrade(self),
            resolved: OnceLock::new(),
        }
    }
}

/// Forward reference to a named layout, resolved through its registry on
/// first access.
///
/// Embedded in descriptors via [`crate::overlay::FieldDescriptor::Lazy`].
/// Cheap to clone; clones made before resolution resolve independently.
#[derive(Clone)]
pub struct LazyRef {
    name: Arc<str>,
    registry: Weak<LayoutRegistry>,
    resolved: OnceLock<Arc<StructLayout>>,
}

impl LazyRef {
    /// Name of the layout this reference points at.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once a resolution has succeeded and been cached.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// Resolves the referenced layout, consulting the registry on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnresolvedLayout`] when the name is not registered,
    /// or [`Error::RegistryGone`] when the registry was dropped before the
    /// first successful resolution.
    pub fn resolve(&self) -> Result<Arc<StructLayout>> {
        if let Some(layout) = self.resolved.get() {
            return Ok(layout.clone());
        }

        let registry = self.registry.upgrade().ok_or(Error::RegistryGone)?;
        let layout = registry
            .get(&self.name)
            .ok_or_else(|| Error::UnresolvedLayout(self.name.to_string()))?;
        Ok(self.resolved.get_or_init(|| layout).clone())
    }
}

// A resolved reference can point back at the layout that contains it, so
// Debug must not traverse the cached Arc.
impl fmt::Debug for LazyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyRef")
            .field("name", &self.name)
            .field("resolved", &self.resolved.get().is_some())
            .finish()
    }
}
