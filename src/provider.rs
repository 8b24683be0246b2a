//! # Provider Host
//!
//! The explicit provider attach/detach surface the hosting adapter calls,
//! decoupled from any particular runtime, plus the wiring that keeps managed
//! registries self-advertising.
//!
//! ## Overview
//!
//! Providers contribute schema entries through symmetric
//! [`SchemaConfigurator::configure`] / [`SchemaConfigurator::unconfigure`]
//! calls against the currently-active registry, and contribute capability
//! properties as a sub-context of the host's aggregation tree. Each managed
//! registry carries a change listener that republishes the aggregated
//! property snapshot to the tracking hub whenever an entry is added, updated
//! or removed, so interested consumers learn about capability changes without
//! polling.

use crate::config::SchemaHubConfig;
use crate::error::{Result, SchemaHubError};
use crate::events::CallbackResult;
use crate::logging::log_registry_operation;
use crate::model::RegistryEntry;
use crate::properties::helpers::require_provider_id;
use crate::properties::{PropertyAggregationContext, ServiceProperties};
use crate::registry::notifying_map::MapChangeListener;
use crate::registry::{NamespaceRegistry, ObservedRegistry, RankedRegistrySelector, RegistryTrackingHub};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Provider-side contribution seam: a configurator populates a registry on
/// attach and must take exactly its own entries back out on detach
pub trait SchemaConfigurator: Send + Sync {
    fn configure(&self, registry: &NamespaceRegistry);

    fn unconfigure(&self, registry: &NamespaceRegistry);

    /// Get configurator name for diagnostics
    fn configurator_name(&self) -> &str {
        "unnamed_configurator"
    }
}

/// Republishes the aggregated property snapshot to the hub whenever a
/// managed registry's entries change
struct RepublishOnChange {
    registry_id: u64,
    display_name: String,
    context: Arc<PropertyAggregationContext>,
    hub: Arc<RegistryTrackingHub>,
}

impl RepublishOnChange {
    fn republish(&self) -> CallbackResult {
        let outcome = self.hub.update_observed_registry(ObservedRegistry::new(
            self.registry_id,
            self.display_name.clone(),
            self.context.as_service_properties(true),
        ));
        if !outcome.is_clean() {
            warn!(
                registry_id = self.registry_id,
                failed = outcome.failed(),
                "Listener failures while republishing registry properties"
            );
        }
        Ok(())
    }
}

impl MapChangeListener<String, RegistryEntry> for RepublishOnChange {
    fn entry_added(&self, _key: &String, _value: &RegistryEntry) -> CallbackResult {
        self.republish()
    }

    fn entry_updated(
        &self,
        _key: &String,
        _old_value: &RegistryEntry,
        _new_value: &RegistryEntry,
    ) -> CallbackResult {
        self.republish()
    }

    fn entry_removed(&self, _key: &String, _value: &RegistryEntry) -> CallbackResult {
        self.republish()
    }

    fn map_cleared(&self) -> CallbackResult {
        self.republish()
    }
}

struct ManagedRegistry {
    registry: Arc<NamespaceRegistry>,
    display_name: String,
    listener: Arc<dyn MapChangeListener<String, RegistryEntry>>,
}

/// Host-facing facade wiring registries, the aggregation tree, the active
/// registry selector and the tracking hub together
pub struct SchemaProviderHost {
    config: SchemaHubConfig,
    context: Arc<PropertyAggregationContext>,
    selector: Arc<RankedRegistrySelector>,
    hub: Arc<RegistryTrackingHub>,
    registries: RwLock<HashMap<u64, ManagedRegistry>>,
    providers: RwLock<HashMap<u64, Arc<dyn SchemaConfigurator>>>,
}

impl SchemaProviderHost {
    pub fn new(config: SchemaHubConfig) -> Self {
        Self {
            config,
            context: Arc::new(PropertyAggregationContext::new()),
            selector: Arc::new(RankedRegistrySelector::new()),
            hub: Arc::new(RegistryTrackingHub::new()),
            registries: RwLock::new(HashMap::new()),
            providers: RwLock::new(HashMap::new()),
        }
    }

    pub fn context(&self) -> &Arc<PropertyAggregationContext> {
        &self.context
    }

    pub fn selector(&self) -> &Arc<RankedRegistrySelector> {
        &self.selector
    }

    pub fn hub(&self) -> &Arc<RegistryTrackingHub> {
        &self.hub
    }

    /// Put a registry under management: enter it into rank arbitration, start
    /// tracking it (first observation is silent), and attach the
    /// change listener that keeps its advertised properties current.
    /// Registering an id already under management is ignored.
    pub fn register_registry(
        &self,
        registry_id: u64,
        rank: Option<i32>,
        label: Option<&str>,
        registry: Arc<NamespaceRegistry>,
    ) -> bool {
        let rank = rank.unwrap_or(self.config.default_rank);
        let display_name = label
            .unwrap_or(self.config.default_registry_label.as_str())
            .to_string();

        if !self.selector.register(registry_id, rank, registry.clone()) {
            return false;
        }

        self.hub.add_observed_registry(ObservedRegistry::new(
            registry_id,
            display_name.clone(),
            self.context.as_service_properties(true),
        ));

        let listener: Arc<dyn MapChangeListener<String, RegistryEntry>> =
            Arc::new(RepublishOnChange {
                registry_id,
                display_name: display_name.clone(),
                context: self.context.clone(),
                hub: self.hub.clone(),
            });
        registry.add_change_listener(listener.clone());
        self.registries.write().insert(
            registry_id,
            ManagedRegistry {
                registry,
                display_name,
                listener,
            },
        );

        log_registry_operation("register_registry", Some(registry_id), None, "managed", None);
        true
    }

    /// Withdraw a registry from management: leave arbitration, detach the
    /// republishing listener, and stop tracking (subscribers get one removal
    /// event). Unknown ids are a no-op.
    pub fn unregister_registry(&self, registry_id: u64) -> bool {
        if !self.selector.unregister(registry_id) {
            return false;
        }
        if let Some(managed) = self.registries.write().remove(&registry_id) {
            managed.registry.remove_change_listener(&managed.listener);
        }
        self.hub.remove_observed_registry(registry_id);
        log_registry_operation("unregister_registry", Some(registry_id), None, "withdrawn", None);
        true
    }

    /// Attach a provider: create its property sub-context and let its
    /// configurator populate the currently-active registry. Fails fast when
    /// the provider id is missing or no registry is active.
    pub fn register_provider(
        &self,
        configurator: Arc<dyn SchemaConfigurator>,
        props: &ServiceProperties,
    ) -> Result<()> {
        let provider_id = require_provider_id(props)?;
        let active = self.selector.active().ok_or_else(|| {
            SchemaHubError::RegistryError(
                "No active registry available for provider configuration".to_string(),
            )
        })?;

        self.context.add_sub_context(props)?;
        configurator.configure(&active);
        info!(
            provider_id,
            configurator = configurator.configurator_name(),
            "Registered schema provider"
        );
        self.providers.write().insert(provider_id, configurator);
        Ok(())
    }

    /// Detach a provider: destroy its sub-context and let its configurator
    /// take its entries out of the currently-active registry. Entries the
    /// provider wrote into registries that are no longer active stay where
    /// they are. Unknown providers are logged and ignored.
    pub fn remove_provider(&self, props: &ServiceProperties) -> Result<()> {
        let provider_id = require_provider_id(props)?;
        self.context.remove_sub_context(props)?;

        let Some(configurator) = self.providers.write().remove(&provider_id) else {
            warn!(provider_id, "Ignoring removal of unknown provider");
            return Ok(());
        };
        if let Some(active) = self.selector.active() {
            configurator.unconfigure(&active);
        }

        info!(provider_id, "Removed schema provider");
        Ok(())
    }

    /// Replace a provider's property contribution and re-advertise every
    /// managed registry with the new aggregated snapshot
    pub fn update_provider_properties(&self, props: &ServiceProperties) -> Result<()> {
        let provider_id = require_provider_id(props)?;
        let sub_context = self.context.sub_context(provider_id).ok_or_else(|| {
            SchemaHubError::PropertyError(format!(
                "No property sub-context registered for provider {provider_id}"
            ))
        })?;
        sub_context.update_service_properties(props)?;

        let snapshot: Vec<(u64, String)> = self
            .registries
            .read()
            .iter()
            .map(|(id, managed)| (*id, managed.display_name.clone()))
            .collect();
        for (registry_id, display_name) in snapshot {
            self.hub.update_observed_registry(ObservedRegistry::new(
                registry_id,
                display_name,
                self.context.as_service_properties(true),
            ));
        }
        Ok(())
    }
}
