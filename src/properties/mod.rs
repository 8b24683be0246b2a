//! # Property Aggregation
//!
//! Service property map access and the hierarchical per-provider property
//! merge tree. Providers contribute deduplicated value sets under a fixed set
//! of recognized keys; the published view is the union of everything still
//! registered.

pub mod context;
pub mod helpers;

// Re-export main types for easy access
pub use context::PropertyAggregationContext;
pub use helpers::{provider_id, require_provider_id, string_plus, ServiceProperties};
