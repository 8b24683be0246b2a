//! # Registry Infrastructure
//!
//! The registry components of the aggregation and notification core.
//!
//! ## Available Components
//!
//! - **ChangeNotifyingMap**: map decorator firing add/update/remove/clear
//!   events for its own entries over a read-only fallback view
//! - **NamespaceRegistry**: namespace-URI keyed schema entries with lazy
//!   descriptor resolution and a single optional fallback delegate
//! - **RankedRegistrySelector**: arbitration electing the active registry
//!   among ranked candidates, with no migration on failover
//! - **RegistryTrackingHub**: observation snapshots plus listener fan-out for
//!   registry property changes and removals
//!
//! ## Architecture
//!
//! ```text
//! Registry Infrastructure
//! ├── ChangeNotifyingMap      (eventful entry storage)
//! ├── NamespaceRegistry       (namespace lookup & delegation)
//! ├── RankedRegistrySelector  (active-instance arbitration)
//! └── RegistryTrackingHub     (observation & change fan-out)
//! ```

pub mod namespace_registry;
pub mod notifying_map;
pub mod selector;
pub mod tracking_hub;

// Re-export main types for easy access
pub use namespace_registry::NamespaceRegistry;
pub use notifying_map::{ChangeNotifyingMap, MapChangeListener};
pub use selector::{arbitrate, RankedRegistrySelector, RegistryCandidate};
pub use tracking_hub::{HubStats, ObservedRegistry, RegistryTrackingHub, TrackedRegistryInfo};
