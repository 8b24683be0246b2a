use crate::constants::labels;
use crate::error::{Result, SchemaHubError};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct SchemaHubConfig {
    pub default_rank: i32,
    pub default_registry_label: String,
    pub custom_settings: HashMap<String, String>,
}

impl Default for SchemaHubConfig {
    fn default() -> Self {
        Self {
            default_rank: 0,
            default_registry_label: labels::NAMESPACE_REGISTRY.to_string(),
            custom_settings: HashMap::new(),
        }
    }
}

impl SchemaHubConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(rank) = std::env::var("SCHEMAHUB_DEFAULT_RANK") {
            config.default_rank = rank.parse().map_err(|e| {
                SchemaHubError::ConfigurationError(format!("Invalid default_rank: {e}"))
            })?;
        }

        if let Ok(label) = std::env::var("SCHEMAHUB_REGISTRY_LABEL") {
            config.default_registry_label = label;
        }

        Ok(config)
    }
}
