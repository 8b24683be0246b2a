//! # Property Aggregation Context
//!
//! Hierarchical multi-valued property merge tree keyed by provider id.
//!
//! ## Overview
//!
//! Each context maintains, per recognized [`PropertyKey`], a map from provider
//! id to that provider's contributed value set. Providers joining the system
//! get a nested sub-context keyed by their id; leaving destroys it. The
//! published view unions all still-registered contributions per key, so
//! removing a provider removes its values immediately with no stale residue.
//!
//! ## Usage
//!
//! ```rust
//! use schemahub_core::properties::{PropertyAggregationContext, ServiceProperties};
//! use schemahub_core::PropertyKey;
//! use serde_json::json;
//! use std::collections::HashMap;
//!
//! # fn example() -> schemahub_core::Result<()> {
//! let context = PropertyAggregationContext::new();
//!
//! let props: ServiceProperties = HashMap::from([
//!     ("provider.id".to_string(), json!(7)),
//!     ("schema.name".to_string(), json!(["order", "invoice"])),
//! ]);
//! context.add_sub_context(&props)?;
//!
//! let published = context.published(true);
//! assert!(published[&PropertyKey::Name].contains("order"));
//! # Ok(())
//! # }
//! ```

use crate::constants::PropertyKey;
use crate::error::Result;
use crate::properties::helpers::{self, ServiceProperties};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

type KeyContributions = HashMap<u64, HashSet<String>>;

/// Hierarchical multi-valued property merge tree keyed by provider id
pub struct PropertyAggregationContext {
    /// Per recognized key: provider id to contributed value set
    key_values: RwLock<HashMap<PropertyKey, KeyContributions>>,
    /// Nested contexts keyed by the owning provider id
    sub_contexts: RwLock<HashMap<u64, Arc<PropertyAggregationContext>>>,
}

impl PropertyAggregationContext {
    /// Create an empty context with every recognized key pre-assigned its own
    /// contribution map
    pub fn new() -> Self {
        let key_values = PropertyKey::ALL
            .iter()
            .map(|key| (*key, KeyContributions::new()))
            .collect();
        Self {
            key_values: RwLock::new(key_values),
            sub_contexts: RwLock::new(HashMap::new()),
        }
    }

    /// Create a context seeded from a property map carrying a provider id
    pub fn from_service_properties(props: &ServiceProperties) -> Result<Self> {
        let context = Self::new();
        context.update_service_properties(props)?;
        Ok(context)
    }

    /// Replace the owning provider's contribution for every recognized key
    /// present in `props`. Keys absent from `props` keep their previous
    /// contribution. Fails fast when the provider id is missing.
    pub fn update_service_properties(&self, props: &ServiceProperties) -> Result<()> {
        let provider = helpers::require_provider_id(props)?;
        let mut key_values = self.key_values.write();
        for key in PropertyKey::ALL {
            if let Some(values) = helpers::string_plus(props, key.as_str()) {
                if let Some(contributions) = key_values.get_mut(&key) {
                    contributions.insert(provider, values);
                }
            }
        }
        Ok(())
    }

    /// Drop every contribution made directly by the given provider
    pub fn clear_provider(&self, provider: u64) {
        let mut key_values = self.key_values.write();
        for contributions in key_values.values_mut() {
            contributions.remove(&provider);
        }
    }

    /// Create a nested sub-context for the provider id carried in `props`,
    /// seeded from `props`, replacing any previous sub-context for that id
    pub fn add_sub_context(
        &self,
        props: &ServiceProperties,
    ) -> Result<Arc<PropertyAggregationContext>> {
        let provider = helpers::require_provider_id(props)?;
        let sub_context = Arc::new(Self::from_service_properties(props)?);
        self.sub_contexts.write().insert(provider, sub_context.clone());
        debug!(provider_id = provider, "Added property sub-context");
        Ok(sub_context)
    }

    /// Destroy the sub-context for the provider id carried in `props` and
    /// return it. Fails fast when the id is missing; an unknown id yields
    /// `None`.
    pub fn remove_sub_context(
        &self,
        props: &ServiceProperties,
    ) -> Result<Option<Arc<PropertyAggregationContext>>> {
        let provider = helpers::require_provider_id(props)?;
        let removed = self.sub_contexts.write().remove(&provider);
        if removed.is_some() {
            debug!(provider_id = provider, "Removed property sub-context");
        }
        Ok(removed)
    }

    /// Look up the live sub-context for a provider id
    pub fn sub_context(&self, provider: u64) -> Option<Arc<PropertyAggregationContext>> {
        self.sub_contexts.read().get(&provider).cloned()
    }

    /// Flatten to one map unioning, per key, all still-registered providers'
    /// values. With `merged`, all sub-contexts are first unioned into a
    /// temporary context before flattening. Keys with no values are omitted.
    pub fn published(&self, merged: bool) -> HashMap<PropertyKey, HashSet<String>> {
        if !merged {
            return self.flatten();
        }
        let snapshot: Vec<Arc<PropertyAggregationContext>> =
            self.sub_contexts.read().values().cloned().collect();
        let combined = PropertyAggregationContext::new();
        Self::merge_into(self, &combined);
        for sub_context in &snapshot {
            Self::merge_into(sub_context, &combined);
        }
        combined.flatten()
    }

    /// Render the published view as a service property map with sorted array
    /// values, suitable for advertising through the tracking hub
    pub fn as_service_properties(&self, merged: bool) -> ServiceProperties {
        let mut props = ServiceProperties::new();
        for (key, values) in self.published(merged) {
            helpers::insert_string_set(&mut props, key.as_str(), &values);
        }
        props
    }

    fn flatten(&self) -> HashMap<PropertyKey, HashSet<String>> {
        let key_values = self.key_values.read();
        let mut flattened = HashMap::new();
        for (key, contributions) in key_values.iter() {
            let union: HashSet<String> = contributions.values().flatten().cloned().collect();
            if !union.is_empty() {
                flattened.insert(*key, union);
            }
        }
        flattened
    }

    /// Union every per-provider contribution of `source` into `target`
    fn merge_into(source: &PropertyAggregationContext, target: &PropertyAggregationContext) {
        let source_values = source.key_values.read();
        let mut target_values = target.key_values.write();
        for (key, contributions) in source_values.iter() {
            let target_contributions = target_values.entry(*key).or_default();
            for (provider, values) in contributions {
                target_contributions
                    .entry(*provider)
                    .or_default()
                    .extend(values.iter().cloned());
            }
        }
    }
}

impl Default for PropertyAggregationContext {
    fn default() -> Self {
        Self::new()
    }
}
