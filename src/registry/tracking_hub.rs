//! # Registry Tracking Hub
//!
//! Central pub/sub for observed registries: tracks metadata snapshots by
//! registry id and routes change and removal events to subscribed listeners.
//!
//! ## Overview
//!
//! The hub stores one [`TrackedRegistryInfo`] snapshot per observed registry
//! id, a forward index from listener to subscribed ids, and a reverse index
//! from id to interested listeners. First observation of an id is silent by
//! contract; a consumer wanting initial state reads it through
//! [`RegistryTrackingHub::get_service_properties`] at subscribe time.
//! Updates and removals fan out synchronously on the mutating thread,
//! iterating a snapshot copy of the subscriber set and isolating each
//! listener failure.
//!
//! Every index synchronizes internally per data structure; no operation holds
//! locks across structures, so a slow listener can stall its own fan-out but
//! never an unrelated id's bookkeeping.
//!
//! ## Usage
//!
//! ```rust
//! use schemahub_core::events::{CallbackResult, RegistryPropertyListener};
//! use schemahub_core::properties::ServiceProperties;
//! use schemahub_core::registry::{ObservedRegistry, RegistryTrackingHub};
//! use std::collections::HashSet;
//! use std::sync::Arc;
//!
//! struct CapabilityMonitor;
//!
//! impl RegistryPropertyListener for CapabilityMonitor {
//!     fn on_properties_changed(
//!         &self,
//!         service_id: u64,
//!         display_name: &str,
//!         _properties: &ServiceProperties,
//!     ) -> CallbackResult {
//!         println!("{display_name} ({service_id}) changed");
//!         Ok(())
//!     }
//!
//!     fn on_service_removed(&self, service_id: u64, display_name: &str) -> CallbackResult {
//!         println!("{display_name} ({service_id}) removed");
//!         Ok(())
//!     }
//! }
//!
//! let hub = RegistryTrackingHub::new();
//! let listener: Arc<dyn RegistryPropertyListener> = Arc::new(CapabilityMonitor);
//! hub.register_listener(listener, HashSet::from([100]));
//!
//! hub.add_observed_registry(ObservedRegistry::new(
//!     100,
//!     "namespace registry",
//!     ServiceProperties::new(),
//! ));
//! ```

use crate::events::{DispatchFailure, DispatchOutcome, RegistryPropertyListener};
use crate::logging::log_listener_failure;
use crate::properties::ServiceProperties;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Last-known metadata snapshot for one observed registry
#[derive(Debug, Clone)]
pub struct TrackedRegistryInfo {
    pub display_name: String,
    pub properties: ServiceProperties,
    pub observed_at: DateTime<Utc>,
}

/// A registry observation handed to the hub: externally assigned id, display
/// label distinguishing its role, and the current property snapshot
#[derive(Debug, Clone)]
pub struct ObservedRegistry {
    pub registry_id: u64,
    pub display_name: String,
    pub properties: ServiceProperties,
}

impl ObservedRegistry {
    pub fn new(
        registry_id: u64,
        display_name: impl Into<String>,
        properties: ServiceProperties,
    ) -> Self {
        Self {
            registry_id,
            display_name: display_name.into(),
            properties,
        }
    }

    fn into_info(self) -> (u64, TrackedRegistryInfo) {
        (
            self.registry_id,
            TrackedRegistryInfo {
                display_name: self.display_name,
                properties: self.properties,
                observed_at: Utc::now(),
            },
        )
    }
}

/// Opaque listener identity derived from the registered `Arc` pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ListenerKey(usize);

impl ListenerKey {
    fn of(listener: &Arc<dyn RegistryPropertyListener>) -> Self {
        Self(Arc::as_ptr(listener) as *const () as usize)
    }
}

struct ListenerRegistration {
    listener: Arc<dyn RegistryPropertyListener>,
    service_ids: HashSet<u64>,
}

/// Hub statistics for monitoring
#[derive(Debug, Clone, Default)]
pub struct HubStats {
    pub tracked_services: usize,
    pub registered_listeners: usize,
    pub total_subscriptions: usize,
}

/// Central registry observation and change-notification hub
pub struct RegistryTrackingHub {
    /// Snapshot per observed registry id
    tracked_services: DashMap<u64, TrackedRegistryInfo>,
    /// Forward index: listener identity to its subscribed ids
    listener_service_ids: DashMap<ListenerKey, ListenerRegistration>,
    /// Reverse index: registry id to interested listener identities
    service_listeners: DashMap<u64, HashSet<ListenerKey>>,
}

impl RegistryTrackingHub {
    pub fn new() -> Self {
        Self {
            tracked_services: DashMap::new(),
            listener_service_ids: DashMap::new(),
            service_listeners: DashMap::new(),
        }
    }

    /// Subscribe a listener to a set of registry ids, replacing any prior
    /// subscription set for that listener
    pub fn register_listener(
        &self,
        listener: Arc<dyn RegistryPropertyListener>,
        service_ids: HashSet<u64>,
    ) {
        let key = ListenerKey::of(&listener);
        let previous = self.listener_service_ids.insert(
            key,
            ListenerRegistration {
                listener,
                service_ids: service_ids.clone(),
            },
        );

        // Drop reverse-index entries for ids no longer subscribed
        if let Some(previous) = previous {
            for stale_id in previous.service_ids.difference(&service_ids) {
                self.drop_reverse_entry(*stale_id, key);
            }
        }

        for service_id in &service_ids {
            self.service_listeners
                .entry(*service_id)
                .or_default()
                .insert(key);
        }
        debug!(subscriptions = service_ids.len(), "Registered hub listener");
    }

    /// Remove a listener from every index; unknown listeners are a no-op
    pub fn unregister_listener(&self, listener: &Arc<dyn RegistryPropertyListener>) {
        let key = ListenerKey::of(listener);
        if let Some((_, registration)) = self.listener_service_ids.remove(&key) {
            for service_id in registration.service_ids {
                self.drop_reverse_entry(service_id, key);
            }
            debug!("Unregistered hub listener");
        }
    }

    /// Store the first snapshot for a registry id. First observation fires no
    /// listener event by contract.
    pub fn add_observed_registry(&self, observed: ObservedRegistry) {
        let (registry_id, info) = observed.into_info();
        debug!(
            registry_id,
            display_name = %info.display_name,
            "Tracking observed registry"
        );
        self.tracked_services.insert(registry_id, info);
    }

    /// Overwrite the stored snapshot and synchronously notify every listener
    /// subscribed to this id
    pub fn update_observed_registry(&self, observed: ObservedRegistry) -> DispatchOutcome {
        let (registry_id, info) = observed.into_info();
        let display_name = info.display_name.clone();
        let properties = info.properties.clone();
        self.tracked_services.insert(registry_id, info);

        let mut outcome = DispatchOutcome::default();
        for listener in self.subscribers_snapshot(registry_id) {
            match listener.on_properties_changed(registry_id, &display_name, &properties) {
                Ok(()) => outcome.record_success(),
                Err(e) => {
                    log_listener_failure(
                        listener.listener_name(),
                        "properties_changed",
                        registry_id,
                        &e.to_string(),
                    );
                    outcome.record_failure(DispatchFailure {
                        listener: listener.listener_name().to_string(),
                        event: "properties_changed".to_string(),
                        service_id: registry_id,
                        message: e.to_string(),
                    });
                }
            }
        }
        outcome
    }

    /// Delete the snapshot for a registry id, notify its subscribers, then
    /// drop every subscription indexed by that id so nothing dangles.
    /// Removing an untracked id is a no-op.
    pub fn remove_observed_registry(&self, registry_id: u64) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let Some((_, info)) = self.tracked_services.remove(&registry_id) else {
            return outcome;
        };

        for listener in self.subscribers_snapshot(registry_id) {
            match listener.on_service_removed(registry_id, &info.display_name) {
                Ok(()) => outcome.record_success(),
                Err(e) => {
                    log_listener_failure(
                        listener.listener_name(),
                        "service_removed",
                        registry_id,
                        &e.to_string(),
                    );
                    outcome.record_failure(DispatchFailure {
                        listener: listener.listener_name().to_string(),
                        event: "service_removed".to_string(),
                        service_id: registry_id,
                        message: e.to_string(),
                    });
                }
            }
        }

        // Subscriptions indexed by this id die with the snapshot
        if let Some((_, keys)) = self.service_listeners.remove(&registry_id) {
            for key in keys {
                if let Some(mut registration) = self.listener_service_ids.get_mut(&key) {
                    registration.service_ids.remove(&registry_id);
                }
            }
        }
        debug!(registry_id, "Stopped tracking observed registry");
        outcome
    }

    /// Read-only access to the last-known snapshot; absent ids yield `None`
    pub fn get_service_properties(&self, registry_id: u64) -> Option<ServiceProperties> {
        self.tracked_services
            .get(&registry_id)
            .map(|info| info.properties.clone())
    }

    /// Every currently tracked registry id; empty when nothing is tracked
    pub fn get_tracked_service_ids(&self) -> HashSet<u64> {
        self.tracked_services.iter().map(|e| *e.key()).collect()
    }

    /// Get hub statistics
    pub fn get_stats(&self) -> HubStats {
        HubStats {
            tracked_services: self.tracked_services.len(),
            registered_listeners: self.listener_service_ids.len(),
            total_subscriptions: self
                .listener_service_ids
                .iter()
                .map(|e| e.service_ids.len())
                .sum(),
        }
    }

    /// Snapshot copy of the listeners subscribed to one id, so fan-out
    /// tolerates concurrent subscription changes
    fn subscribers_snapshot(&self, registry_id: u64) -> Vec<Arc<dyn RegistryPropertyListener>> {
        let keys: Vec<ListenerKey> = match self.service_listeners.get(&registry_id) {
            Some(entry) => entry.iter().copied().collect(),
            None => return Vec::new(),
        };
        keys.iter()
            .filter_map(|key| {
                self.listener_service_ids
                    .get(key)
                    .map(|registration| registration.listener.clone())
            })
            .collect()
    }

    fn drop_reverse_entry(&self, service_id: u64, key: ListenerKey) {
        if let Some(mut entry) = self.service_listeners.get_mut(&service_id) {
            entry.remove(&key);
            if entry.is_empty() {
                drop(entry);
                self.service_listeners
                    .remove_if(&service_id, |_, keys| keys.is_empty());
            }
        }
    }
}

impl Default for RegistryTrackingHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CallbackResult;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Test listener recording every callback it receives
    struct TestListener {
        name: String,
        changed: AtomicU64,
        removed: AtomicU64,
        seen: Mutex<Vec<(u64, String)>>,
    }

    impl TestListener {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                changed: AtomicU64::new(0),
                removed: AtomicU64::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn changed(&self) -> u64 {
            self.changed.load(Ordering::Relaxed)
        }

        fn removed(&self) -> u64 {
            self.removed.load(Ordering::Relaxed)
        }
    }

    impl RegistryPropertyListener for TestListener {
        fn on_properties_changed(
            &self,
            service_id: u64,
            display_name: &str,
            _properties: &ServiceProperties,
        ) -> CallbackResult {
            self.changed.fetch_add(1, Ordering::Relaxed);
            self.seen.lock().push((service_id, display_name.to_string()));
            Ok(())
        }

        fn on_service_removed(&self, service_id: u64, display_name: &str) -> CallbackResult {
            self.removed.fetch_add(1, Ordering::Relaxed);
            self.seen.lock().push((service_id, display_name.to_string()));
            Ok(())
        }

        fn listener_name(&self) -> &str {
            &self.name
        }
    }

    struct FailingListener;

    impl RegistryPropertyListener for FailingListener {
        fn on_properties_changed(
            &self,
            _service_id: u64,
            _display_name: &str,
            _properties: &ServiceProperties,
        ) -> CallbackResult {
            Err("listener exploded".into())
        }

        fn on_service_removed(&self, _service_id: u64, _display_name: &str) -> CallbackResult {
            Err("listener exploded".into())
        }
    }

    fn observed(id: u64) -> ObservedRegistry {
        ObservedRegistry::new(
            id,
            "namespace registry",
            ServiceProperties::from([("schema.name".to_string(), json!(["order"]))]),
        )
    }

    #[test]
    fn test_first_add_is_silent() {
        let hub = RegistryTrackingHub::new();
        let listener = TestListener::new("monitor");
        hub.register_listener(listener.clone(), HashSet::from([100]));

        hub.add_observed_registry(observed(100));
        assert_eq!(listener.changed(), 0);

        // Initial state is available synchronously instead
        assert!(hub.get_service_properties(100).is_some());
    }

    #[test]
    fn test_update_notifies_only_subscribed_ids() {
        let hub = RegistryTrackingHub::new();
        let listener = TestListener::new("monitor");
        hub.register_listener(listener.clone(), HashSet::from([100]));

        hub.add_observed_registry(observed(200));
        let outcome = hub.update_observed_registry(observed(200));

        assert_eq!(listener.changed(), 0);
        assert_eq!(outcome.notified, 0);
    }

    #[test]
    fn test_registration_replaces_prior_id_set() {
        let hub = RegistryTrackingHub::new();
        let listener = TestListener::new("monitor");
        hub.register_listener(listener.clone(), HashSet::from([1, 2]));
        hub.register_listener(listener.clone(), HashSet::from([3]));

        hub.add_observed_registry(observed(1));
        hub.add_observed_registry(observed(3));

        hub.update_observed_registry(observed(1));
        assert_eq!(listener.changed(), 0);

        let outcome = hub.update_observed_registry(observed(3));
        assert_eq!(listener.changed(), 1);
        assert_eq!(outcome.notified, 1);
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_removal_completeness() {
        let hub = RegistryTrackingHub::new();
        let listener = TestListener::new("monitor");
        hub.register_listener(listener.clone(), HashSet::from([100]));

        hub.add_observed_registry(observed(100));
        let outcome = hub.remove_observed_registry(100);

        assert_eq!(listener.removed(), 1);
        assert_eq!(outcome.notified, 1);
        assert!(!hub.get_tracked_service_ids().contains(&100));
        assert!(hub.get_service_properties(100).is_none());

        // Subscriptions indexed by the id died with it: re-adding starts
        // fresh and fires nothing for the old subscription
        hub.add_observed_registry(observed(100));
        hub.update_observed_registry(observed(100));
        assert_eq!(listener.changed(), 0);
    }

    #[test]
    fn test_remove_untracked_id_is_noop() {
        let hub = RegistryTrackingHub::new();
        let listener = TestListener::new("monitor");
        hub.register_listener(listener.clone(), HashSet::from([100]));

        let outcome = hub.remove_observed_registry(100);
        assert_eq!(outcome.notified, 0);
        assert_eq!(listener.removed(), 0);
    }

    #[test]
    fn test_unregister_listener_is_idempotent() {
        let hub = RegistryTrackingHub::new();
        let listener = TestListener::new("monitor");

        // Unknown listener: nothing happens
        let as_dyn: Arc<dyn RegistryPropertyListener> = listener.clone();
        hub.unregister_listener(&as_dyn);

        hub.register_listener(listener.clone(), HashSet::from([100]));
        hub.unregister_listener(&as_dyn);
        hub.unregister_listener(&as_dyn);

        hub.add_observed_registry(observed(100));
        hub.update_observed_registry(observed(100));
        assert_eq!(listener.changed(), 0);
        assert_eq!(hub.get_stats().registered_listeners, 0);
    }

    #[test]
    fn test_failing_listener_does_not_stop_fanout() {
        let hub = RegistryTrackingHub::new();
        let healthy = TestListener::new("healthy");
        let failing: Arc<dyn RegistryPropertyListener> = Arc::new(FailingListener);

        hub.register_listener(failing, HashSet::from([100]));
        hub.register_listener(healthy.clone(), HashSet::from([100]));

        hub.add_observed_registry(observed(100));
        let outcome = hub.update_observed_registry(observed(100));

        assert_eq!(healthy.changed(), 1);
        assert_eq!(outcome.notified, 2);
        assert_eq!(outcome.failed(), 1);
    }

    #[test]
    fn test_update_passes_display_name_and_properties() {
        let hub = RegistryTrackingHub::new();
        let listener = TestListener::new("monitor");
        hub.register_listener(listener.clone(), HashSet::from([7]));

        hub.add_observed_registry(ObservedRegistry::new(7, "factory registry", ServiceProperties::new()));
        hub.update_observed_registry(ObservedRegistry::new(7, "factory registry", ServiceProperties::new()));

        let seen = listener.seen.lock();
        assert_eq!(seen.as_slice(), &[(7, "factory registry".to_string())]);
    }

    #[test]
    fn test_stats_reflect_indexes() {
        let hub = RegistryTrackingHub::new();
        let first = TestListener::new("first");
        let second = TestListener::new("second");
        hub.register_listener(first, HashSet::from([1, 2]));
        hub.register_listener(second, HashSet::from([2]));
        hub.add_observed_registry(observed(1));

        let stats = hub.get_stats();
        assert_eq!(stats.tracked_services, 1);
        assert_eq!(stats.registered_listeners, 2);
        assert_eq!(stats.total_subscriptions, 3);
    }
}
