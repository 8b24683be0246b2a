//! # Change Notifying Map
//!
//! A map decorator holding a primary mutable map together with a read-only
//! fallback map, firing add/update/remove/clear events for primary entries.
//!
//! ## Overview
//!
//! Reads check the primary map first and fall back to the read-only map;
//! fallback entries never emit events. Aggregate views (`len`, `keys`,
//! `entries`, ...) report the union of both maps with primary entries
//! shadowing fallback entries on key collision.
//!
//! Listener dispatch snapshots the listener list and isolates each listener:
//! one listener failing is logged and does not prevent the remaining listeners
//! from being called, nor does it surface to the caller of the mutating
//! operation.

use crate::events::CallbackResult;
use parking_lot::RwLock;
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;
use tracing::error;

/// Observer of primary-map mutations. All callbacks default to no-ops so
/// listeners implement only the events they care about.
pub trait MapChangeListener<K, V>: Send + Sync {
    fn entry_added(&self, _key: &K, _value: &V) -> CallbackResult {
        Ok(())
    }

    fn entry_updated(&self, _key: &K, _old_value: &V, _new_value: &V) -> CallbackResult {
        Ok(())
    }

    fn entry_removed(&self, _key: &K, _value: &V) -> CallbackResult {
        Ok(())
    }

    fn map_cleared(&self) -> CallbackResult {
        Ok(())
    }
}

/// Map wrapper firing change events for its own (non-fallback) entries
pub struct ChangeNotifyingMap<K, V> {
    primary: RwLock<HashMap<K, V>>,
    fallback: HashMap<K, V>,
    listeners: RwLock<Vec<Arc<dyn MapChangeListener<K, V>>>>,
}

impl<K, V> ChangeNotifyingMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::with_fallback(HashMap::new())
    }

    /// Create a map over a read-only fallback of pre-seeded entries
    pub fn with_fallback(fallback: HashMap<K, V>) -> Self {
        Self {
            primary: RwLock::new(HashMap::new()),
            fallback,
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Primary entry if present, else the fallback entry
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        if let Some(value) = self.primary.read().get(key) {
            return Some(value.clone());
        }
        self.fallback.get(key).cloned()
    }

    /// Insert into the primary map, firing `entry_added` for a new key or
    /// `entry_updated` for an existing one. Returns the previous primary
    /// value. A fallback entry shadowed by a first write counts as new.
    pub fn put(&self, key: K, value: V) -> Option<V> {
        let old_value = self.primary.write().insert(key.clone(), value.clone());
        match &old_value {
            None => self.notify("entry_added", |l| l.entry_added(&key, &value)),
            Some(old) => self.notify("entry_updated", |l| l.entry_updated(&key, old, &value)),
        }
        old_value
    }

    /// Remove from the primary map, firing `entry_removed` only when a
    /// primary entry was actually removed. Fallback entries are untouched.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let removed = self.primary.write().remove_entry(key);
        removed.map(|(key, value)| {
            self.notify("entry_removed", |l| l.entry_removed(&key, &value));
            value
        })
    }

    /// Clear the primary map. Fires `map_cleared` only on a non-empty to
    /// empty transition; clearing an already-empty map emits nothing.
    pub fn clear(&self) {
        let was_populated = {
            let mut primary = self.primary.write();
            let was_populated = !primary.is_empty();
            primary.clear();
            was_populated
        };
        if was_populated {
            self.notify("map_cleared", |l| l.map_cleared());
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.primary.read().contains_key(key) || self.fallback.contains_key(key)
    }

    /// Number of distinct keys across primary and fallback
    pub fn len(&self) -> usize {
        let primary = self.primary.read();
        let shadowed = self
            .fallback
            .keys()
            .filter(|key| primary.contains_key(*key))
            .count();
        primary.len() + self.fallback.len() - shadowed
    }

    pub fn is_empty(&self) -> bool {
        self.primary.read().is_empty() && self.fallback.is_empty()
    }

    pub fn keys(&self) -> HashSet<K> {
        let primary = self.primary.read();
        let mut keys: HashSet<K> = self.fallback.keys().cloned().collect();
        keys.extend(primary.keys().cloned());
        keys
    }

    /// Union view with primary entries shadowing fallback entries
    pub fn entries(&self) -> HashMap<K, V> {
        let primary = self.primary.read();
        let mut entries = self.fallback.clone();
        for (key, value) in primary.iter() {
            entries.insert(key.clone(), value.clone());
        }
        entries
    }

    pub fn values(&self) -> Vec<V> {
        self.entries().into_values().collect()
    }

    pub fn add_listener(&self, listener: Arc<dyn MapChangeListener<K, V>>) {
        self.listeners.write().push(listener);
    }

    pub fn remove_listener(&self, listener: &Arc<dyn MapChangeListener<K, V>>) {
        self.listeners
            .write()
            .retain(|candidate| !Arc::ptr_eq(candidate, listener));
    }

    /// Invoke `callback` on a snapshot of the current listeners, isolating
    /// each one so a failure never reaches the mutating caller
    fn notify<F>(&self, event: &str, callback: F)
    where
        F: Fn(&dyn MapChangeListener<K, V>) -> CallbackResult,
    {
        let snapshot: Vec<Arc<dyn MapChangeListener<K, V>>> =
            self.listeners.read().iter().cloned().collect();
        for listener in snapshot {
            if let Err(e) = callback(listener.as_ref()) {
                error!(event = %event, error = %e, "Map change listener failed");
            }
        }
    }
}

impl<K, V> Default for ChangeNotifyingMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[derive(Default)]
    struct CountingListener {
        added: AtomicU64,
        updated: AtomicU64,
        removed: AtomicU64,
        cleared: AtomicU64,
    }

    impl MapChangeListener<String, u32> for CountingListener {
        fn entry_added(&self, _key: &String, _value: &u32) -> CallbackResult {
            self.added.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn entry_updated(&self, _key: &String, _old: &u32, _new: &u32) -> CallbackResult {
            self.updated.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn entry_removed(&self, _key: &String, _value: &u32) -> CallbackResult {
            self.removed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn map_cleared(&self) -> CallbackResult {
            self.cleared.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    struct FailingListener;

    impl MapChangeListener<String, u32> for FailingListener {
        fn entry_added(&self, _key: &String, _value: &u32) -> CallbackResult {
            Err("listener exploded".into())
        }
    }

    fn listening_map() -> (ChangeNotifyingMap<String, u32>, Arc<CountingListener>) {
        let map = ChangeNotifyingMap::new();
        let listener = Arc::new(CountingListener::default());
        map.add_listener(listener.clone());
        (map, listener)
    }

    #[test]
    fn test_put_fires_added_then_updated() {
        let (map, listener) = listening_map();

        assert!(map.put("a".to_string(), 1).is_none());
        assert_eq!(map.put("a".to_string(), 2), Some(1));

        assert_eq!(listener.added.load(Ordering::Relaxed), 1);
        assert_eq!(listener.updated.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_remove_fires_only_for_primary_entries() {
        let fallback = HashMap::from([("seed".to_string(), 9)]);
        let map = ChangeNotifyingMap::with_fallback(fallback);
        let listener = Arc::new(CountingListener::default());
        map.add_listener(listener.clone());

        assert!(map.remove("seed").is_none());
        assert!(map.remove("missing").is_none());
        assert_eq!(listener.removed.load(Ordering::Relaxed), 0);

        map.put("own".to_string(), 1);
        assert_eq!(map.remove("own"), Some(1));
        assert_eq!(listener.removed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (map, listener) = listening_map();

        map.clear();
        assert_eq!(listener.cleared.load(Ordering::Relaxed), 0);

        map.put("a".to_string(), 1);
        map.clear();
        map.clear();
        assert_eq!(listener.cleared.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_union_views_shadow_fallback() {
        let fallback = HashMap::from([("a".to_string(), 1), ("b".to_string(), 2)]);
        let map = ChangeNotifyingMap::with_fallback(fallback);
        map.put("b".to_string(), 20);
        map.put("c".to_string(), 3);

        assert_eq!(map.len(), 3);
        assert_eq!(map.get("a"), Some(1));
        assert_eq!(map.get("b"), Some(20));
        assert_eq!(map.entries()[&"b".to_string()], 20);
        assert_eq!(map.keys().len(), 3);
        assert!(!map.is_empty());
    }

    #[test]
    fn test_fallback_reads_never_touch_primary() {
        let fallback = HashMap::from([("seed".to_string(), 9)]);
        let map = ChangeNotifyingMap::with_fallback(fallback);

        assert_eq!(map.get("seed"), Some(9));
        assert!(map.contains_key("seed"));
        map.clear();
        assert_eq!(map.get("seed"), Some(9));
    }

    #[test]
    fn test_failing_listener_is_isolated() {
        let map: ChangeNotifyingMap<String, u32> = ChangeNotifyingMap::new();
        let counting = Arc::new(CountingListener::default());
        map.add_listener(Arc::new(FailingListener));
        map.add_listener(counting.clone());

        // The mutation succeeds and later listeners still run
        map.put("a".to_string(), 1);
        assert_eq!(map.get("a"), Some(1));
        assert_eq!(counting.added.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_remove_listener_stops_events() {
        let (map, listener) = listening_map();
        let as_dyn: Arc<dyn MapChangeListener<String, u32>> = listener.clone();
        map.remove_listener(&as_dyn);

        map.put("a".to_string(), 1);
        assert_eq!(listener.added.load(Ordering::Relaxed), 0);
    }
}
