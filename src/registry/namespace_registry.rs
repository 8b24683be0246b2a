//! # Namespace Registry
//!
//! Keyed map of namespace-URI to schema entries with a single optional
//! fallback delegate.
//!
//! ## Overview
//!
//! Entries are either resolved schemas or lazy descriptors; a descriptor is
//! resolved on first access and the result cached in place, so change
//! listeners observe the resolution as an entry update. The delegate is a
//! non-owning reference to another registry consulted only by the explicit
//! delegated lookup; delegate results are never cached locally, keeping them
//! fresh. Multi-hop chains arise naturally when the delegate itself holds a
//! delegate.
//!
//! ## Usage
//!
//! ```rust
//! use schemahub_core::model::{RegistryEntry, SchemaModel};
//! use schemahub_core::registry::NamespaceRegistry;
//! use std::sync::Arc;
//!
//! # fn example() -> schemahub_core::Result<()> {
//! let registry = Arc::new(NamespaceRegistry::new());
//! let schema = Arc::new(SchemaModel::new("http://example.com/order/1.0", "order"));
//! registry.put_schema(schema);
//!
//! assert!(registry.get("http://example.com/order/1.0")?.is_some());
//! assert!(registry.get("http://example.com/missing")?.is_none());
//! # Ok(())
//! # }
//! ```

use crate::model::{RegistryEntry, SchemaDescriptor, SchemaModel};
use crate::registry::notifying_map::{ChangeNotifyingMap, MapChangeListener};
use crate::Result;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Keyed map of namespace-URI to schema entries with one optional delegate
pub struct NamespaceRegistry {
    entries: ChangeNotifyingMap<String, RegistryEntry>,
    /// Non-owning fallback reference; a dropped delegate behaves as none
    delegate: RwLock<Option<Weak<NamespaceRegistry>>>,
}

impl NamespaceRegistry {
    pub fn new() -> Self {
        Self::with_fallback(HashMap::new())
    }

    /// Create a registry over a read-only map of well-known entries that
    /// never emit change events
    pub fn with_fallback(fallback: HashMap<String, RegistryEntry>) -> Self {
        Self {
            entries: ChangeNotifyingMap::with_fallback(fallback),
            delegate: RwLock::new(None),
        }
    }

    /// Get the schema registered under a namespace URI, resolving and caching
    /// a lazy descriptor on first access.
    ///
    /// Resolution failure propagates to the caller and leaves the entry
    /// unmodified, so a later call retries. A missing key yields `Ok(None)`;
    /// the delegate is not consulted (see [`NamespaceRegistry::delegated_get`]).
    pub fn get(&self, ns_uri: &str) -> Result<Option<Arc<SchemaModel>>> {
        match self.entries.get(ns_uri) {
            None => Ok(None),
            Some(RegistryEntry::Schema(schema)) => Ok(Some(schema)),
            Some(RegistryEntry::Descriptor(descriptor)) => {
                let schema = descriptor.load()?;
                // Cache the resolution in place; listeners see it as an update
                self.entries
                    .put(ns_uri.to_string(), RegistryEntry::Schema(schema.clone()));
                debug!(
                    namespace = ns_uri,
                    descriptor = descriptor.descriptor_name(),
                    "Resolved lazy schema descriptor"
                );
                Ok(Some(schema))
            }
        }
    }

    /// Get the schema for a namespace URI, forwarding to the delegate when it
    /// is absent locally. The delegate's result is not cached locally.
    pub fn delegated_get(&self, ns_uri: &str) -> Result<Option<Arc<SchemaModel>>> {
        if let Some(schema) = self.get(ns_uri)? {
            return Ok(Some(schema));
        }
        match self.delegate() {
            Some(delegate) => delegate.delegated_get(ns_uri),
            None => Ok(None),
        }
    }

    /// Register an entry under a namespace URI; last write wins
    pub fn put(&self, ns_uri: String, entry: RegistryEntry) -> Option<RegistryEntry> {
        self.entries.put(ns_uri, entry)
    }

    /// Register a resolved schema under its own namespace URI
    pub fn put_schema(&self, schema: Arc<SchemaModel>) -> Option<RegistryEntry> {
        self.put(schema.ns_uri.clone(), RegistryEntry::Schema(schema))
    }

    /// Register a lazy descriptor under a namespace URI
    pub fn put_descriptor(
        &self,
        ns_uri: String,
        descriptor: Arc<dyn SchemaDescriptor>,
    ) -> Option<RegistryEntry> {
        self.put(ns_uri, RegistryEntry::Descriptor(descriptor))
    }

    pub fn remove(&self, ns_uri: &str) -> Option<RegistryEntry> {
        self.entries.remove(ns_uri)
    }

    /// True when the key exists locally or anywhere along the delegate chain
    pub fn contains_key(&self, ns_uri: &str) -> bool {
        self.entries.contains_key(ns_uri)
            || self
                .delegate()
                .is_some_and(|delegate| delegate.contains_key(ns_uri))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn namespaces(&self) -> HashSet<String> {
        self.entries.keys()
    }

    /// Set the lookup-fallback delegate. Assigning a registry to itself is
    /// silently ignored.
    pub fn set_delegate(self: &Arc<Self>, delegate: &Arc<NamespaceRegistry>) {
        if Arc::ptr_eq(self, delegate) {
            debug!("Ignoring self-delegation attempt");
            return;
        }
        *self.delegate.write() = Some(Arc::downgrade(delegate));
    }

    pub fn clear_delegate(&self) {
        *self.delegate.write() = None;
    }

    fn delegate(&self) -> Option<Arc<NamespaceRegistry>> {
        self.delegate.read().as_ref().and_then(Weak::upgrade)
    }

    pub fn add_change_listener(&self, listener: Arc<dyn MapChangeListener<String, RegistryEntry>>) {
        self.entries.add_listener(listener);
    }

    pub fn remove_change_listener(
        &self,
        listener: &Arc<dyn MapChangeListener<String, RegistryEntry>>,
    ) {
        self.entries.remove_listener(listener);
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaHubError;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct CountingDescriptor {
        schema: Arc<SchemaModel>,
        loads: AtomicU64,
    }

    impl CountingDescriptor {
        fn new(ns_uri: &str) -> Self {
            Self {
                schema: Arc::new(SchemaModel::new(ns_uri, "counted")),
                loads: AtomicU64::new(0),
            }
        }
    }

    impl SchemaDescriptor for CountingDescriptor {
        fn load(&self) -> Result<Arc<SchemaModel>> {
            self.loads.fetch_add(1, Ordering::Relaxed);
            Ok(self.schema.clone())
        }
    }

    struct FailingDescriptor;

    impl SchemaDescriptor for FailingDescriptor {
        fn load(&self) -> Result<Arc<SchemaModel>> {
            Err(SchemaHubError::ResolutionError(
                "descriptor backend unavailable".to_string(),
            ))
        }
    }

    #[test]
    fn test_get_missing_key_without_delegate() {
        let registry = NamespaceRegistry::new();
        assert_eq!(registry.get("http://example.com/missing").unwrap(), None);
        assert_eq!(
            registry.delegated_get("http://example.com/missing").unwrap(),
            None
        );
    }

    #[test]
    fn test_descriptor_resolved_and_cached_once() {
        let registry = NamespaceRegistry::new();
        let descriptor = Arc::new(CountingDescriptor::new("http://example.com/a"));
        registry.put_descriptor("http://example.com/a".to_string(), descriptor.clone());

        let first = registry.get("http://example.com/a").unwrap().unwrap();
        let second = registry.get("http://example.com/a").unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(descriptor.loads.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_resolution_failure_leaves_entry_unmodified() {
        let registry = NamespaceRegistry::new();
        registry.put_descriptor("http://example.com/bad".to_string(), Arc::new(FailingDescriptor));

        assert!(registry.get("http://example.com/bad").is_err());

        // Entry is still the descriptor, so a later call retries resolution
        let entry = registry.remove("http://example.com/bad").unwrap();
        assert!(!entry.is_resolved());
    }

    #[test]
    fn test_last_write_wins() {
        let registry = NamespaceRegistry::new();
        registry.put_schema(Arc::new(SchemaModel::new("http://example.com/a", "first")));
        registry.put_schema(Arc::new(SchemaModel::new("http://example.com/a", "second")));

        let schema = registry.get("http://example.com/a").unwrap().unwrap();
        assert_eq!(schema.name, "second");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_delegated_get_is_not_cached_locally() {
        let upstream = Arc::new(NamespaceRegistry::new());
        upstream.put_schema(Arc::new(SchemaModel::new("http://example.com/up", "up")));

        let local = Arc::new(NamespaceRegistry::new());
        local.set_delegate(&upstream);

        assert!(local.delegated_get("http://example.com/up").unwrap().is_some());
        // Plain get stays local only
        assert!(local.get("http://example.com/up").unwrap().is_none());
        assert!(local.is_empty());

        // Delegate mutations stay visible because nothing was copied over
        upstream.remove("http://example.com/up");
        assert!(local.delegated_get("http://example.com/up").unwrap().is_none());
    }

    #[test]
    fn test_delegate_chain_is_transitive() {
        let root = Arc::new(NamespaceRegistry::new());
        root.put_schema(Arc::new(SchemaModel::new("http://example.com/root", "root")));

        let middle = Arc::new(NamespaceRegistry::new());
        middle.set_delegate(&root);

        let leaf = Arc::new(NamespaceRegistry::new());
        leaf.set_delegate(&middle);

        assert!(leaf.delegated_get("http://example.com/root").unwrap().is_some());
        assert!(leaf.contains_key("http://example.com/root"));
    }

    #[test]
    fn test_self_delegation_is_ignored() {
        let registry = Arc::new(NamespaceRegistry::new());
        registry.set_delegate(&registry);
        assert!(registry.delegate().is_none());
    }

    #[test]
    fn test_dropped_delegate_behaves_as_none() {
        let local = Arc::new(NamespaceRegistry::new());
        {
            let upstream = Arc::new(NamespaceRegistry::new());
            upstream.put_schema(Arc::new(SchemaModel::new("http://example.com/up", "up")));
            local.set_delegate(&upstream);
            assert!(local.contains_key("http://example.com/up"));
        }
        assert!(!local.contains_key("http://example.com/up"));
        assert!(local.delegated_get("http://example.com/up").unwrap().is_none());
    }
}
