//! # System Constants
//!
//! Recognized service property keys, registry role labels, and the typed
//! [`PropertyKey`] enum used throughout the aggregation and tracking layers.
//!
//! Property maps exchanged with providers are plain string-keyed maps; the keys
//! recognized for capability aggregation are a fixed set. Everything outside
//! that set is carried along untouched but never aggregated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// String keys recognized on provider service property maps
pub mod properties {
    /// Mandatory provider identity on every property map passed into the
    /// aggregation and tracking layers. 64-bit, externally assigned.
    pub const PROVIDER_ID: &str = "provider.id";

    pub const SCHEMA_NAME: &str = "schema.name";
    pub const SCHEMA_FEATURE: &str = "schema.feature";
    pub const SCHEMA_VERSION: &str = "schema.version";
    pub const SCHEMA_CONTENT_TYPE: &str = "schema.content.type";
    pub const SCHEMA_FILE_EXTENSION: &str = "schema.file.extension";
    pub const SCHEMA_PROTOCOL: &str = "schema.protocol";
    pub const SCHEMA_SCOPE: &str = "schema.scope";
}

/// Display labels distinguishing the role of a tracked registry
pub mod labels {
    pub const NAMESPACE_REGISTRY: &str = "namespace registry";
    pub const FACTORY_REGISTRY: &str = "factory registry";
}

/// Recognized multi-valued capability property keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKey {
    Name,
    Feature,
    Version,
    ContentType,
    FileExtension,
    Protocol,
    Scope,
}

impl PropertyKey {
    /// Every recognized key, in declaration order
    pub const ALL: [PropertyKey; 7] = [
        PropertyKey::Name,
        PropertyKey::Feature,
        PropertyKey::Version,
        PropertyKey::ContentType,
        PropertyKey::FileExtension,
        PropertyKey::Protocol,
        PropertyKey::Scope,
    ];

    /// The service property map key this enum value corresponds to
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKey::Name => properties::SCHEMA_NAME,
            PropertyKey::Feature => properties::SCHEMA_FEATURE,
            PropertyKey::Version => properties::SCHEMA_VERSION,
            PropertyKey::ContentType => properties::SCHEMA_CONTENT_TYPE,
            PropertyKey::FileExtension => properties::SCHEMA_FILE_EXTENSION,
            PropertyKey::Protocol => properties::SCHEMA_PROTOCOL,
            PropertyKey::Scope => properties::SCHEMA_SCOPE,
        }
    }

    /// Map a service property key string back to its typed form, if recognized
    pub fn from_key_str(key: &str) -> Option<PropertyKey> {
        PropertyKey::ALL.iter().find(|k| k.as_str() == key).copied()
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
