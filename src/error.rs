use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaHubError {
    RegistryError(String),
    ResolutionError(String),
    PropertyError(String),
    ListenerError(String),
    ConfigurationError(String),
}

impl fmt::Display for SchemaHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaHubError::RegistryError(msg) => write!(f, "Registry error: {msg}"),
            SchemaHubError::ResolutionError(msg) => write!(f, "Resolution error: {msg}"),
            SchemaHubError::PropertyError(msg) => write!(f, "Property error: {msg}"),
            SchemaHubError::ListenerError(msg) => write!(f, "Listener error: {msg}"),
            SchemaHubError::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
        }
    }
}

impl std::error::Error for SchemaHubError {}

pub type Result<T> = std::result::Result<T, SchemaHubError>;
