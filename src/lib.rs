#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # SchemaHub Core
//!
//! Capability-registry aggregation and change-notification core for schema
//! providers, embedded inside a larger model-serialization stack.
//!
//! ## Overview
//!
//! Independently appearing and disappearing schema providers publish
//! namespace-to-schema mappings into shared registries. Multiple competing
//! registries coexist, with one elected as the current default through
//! priority ranking, and property changes propagate synchronously to
//! interested consumers without polling.
//!
//! ## Architecture
//!
//! ```text
//! SchemaProviderHost
//! ├── NamespaceRegistry         (namespace lookup, lazy resolution, delegation)
//! │   └── ChangeNotifyingMap    (eventful entry storage over a fallback view)
//! ├── PropertyAggregationContext (per-provider capability property merge tree)
//! ├── RankedRegistrySelector    (active-instance arbitration, no migration)
//! └── RegistryTrackingHub       (observation snapshots, listener fan-out)
//! ```
//!
//! ## Module Organization
//!
//! - [`registry`] - Registry components: notifying map, namespace registry,
//!   ranked selector, tracking hub
//! - [`properties`] - Service property helpers and the aggregation context
//! - [`events`] - Listener callback surface and dispatch diagnostics
//! - [`provider`] - Provider attach/detach surface and host wiring
//! - [`model`] - Schema objects and the lazy descriptor seam
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//! - [`logging`] - Structured logging setup
//!
//! ## Quick Start
//!
//! ```rust
//! use schemahub_core::model::SchemaModel;
//! use schemahub_core::registry::NamespaceRegistry;
//! use std::sync::Arc;
//!
//! # fn example() -> schemahub_core::Result<()> {
//! let registry = Arc::new(NamespaceRegistry::new());
//! registry.put_schema(Arc::new(SchemaModel::new(
//!     "http://example.com/order/1.0",
//!     "order",
//! )));
//!
//! let schema = registry.get("http://example.com/order/1.0")?;
//! assert!(schema.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Single-process and synchronous: notifications are direct same-thread calls
//! from the mutator into each listener, with no scheduler, timeouts or
//! suspension points. Indexes synchronize internally per data structure;
//! nothing acquires cross-structure locks.

pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod logging;
pub mod model;
pub mod properties;
pub mod provider;
pub mod registry;

pub use config::SchemaHubConfig;
pub use constants::PropertyKey;
pub use error::{Result, SchemaHubError};
pub use events::{CallbackResult, DispatchFailure, DispatchOutcome, RegistryPropertyListener};
pub use model::{RegistryEntry, SchemaDescriptor, SchemaModel};
pub use properties::{PropertyAggregationContext, ServiceProperties};
pub use provider::{SchemaConfigurator, SchemaProviderHost};
pub use registry::{
    ChangeNotifyingMap, MapChangeListener, NamespaceRegistry, ObservedRegistry,
    RankedRegistrySelector, RegistryTrackingHub, TrackedRegistryInfo,
};
