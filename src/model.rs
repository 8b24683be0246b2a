//! # Schema Objects
//!
//! The concrete schema object published under a namespace URI, the lazy
//! descriptor seam resolved by the schema-loading layer, and the registry
//! entry type unifying both.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Concrete schema object published under a namespace URI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaModel {
    pub ns_uri: String,
    pub name: String,
    pub version: Option<String>,
}

impl SchemaModel {
    pub fn new(ns_uri: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ns_uri: ns_uri.into(),
            name: name.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Lazy schema descriptor resolved on first registry access.
///
/// Implementations live in the schema-loading layer; this crate only caches
/// the resolved result in place of the descriptor entry.
pub trait SchemaDescriptor: Send + Sync {
    /// Resolve the descriptor to a concrete schema object
    fn load(&self) -> Result<Arc<SchemaModel>>;

    /// Get descriptor name for diagnostics
    fn descriptor_name(&self) -> &str {
        "unnamed_descriptor"
    }
}

/// Entry stored in a namespace registry: either a resolved schema or a lazy
/// descriptor still awaiting its first access
#[derive(Clone)]
pub enum RegistryEntry {
    Schema(Arc<SchemaModel>),
    Descriptor(Arc<dyn SchemaDescriptor>),
}

impl RegistryEntry {
    /// The resolved schema, if this entry has one
    pub fn schema(&self) -> Option<&Arc<SchemaModel>> {
        match self {
            RegistryEntry::Schema(schema) => Some(schema),
            RegistryEntry::Descriptor(_) => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, RegistryEntry::Schema(_))
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryEntry::Schema(schema) => f.debug_tuple("Schema").field(schema).finish(),
            RegistryEntry::Descriptor(descriptor) => f
                .debug_tuple("Descriptor")
                .field(&descriptor.descriptor_name())
                .finish(),
        }
    }
}
