//! Error types for mapping registration and dispatch

use thiserror::Error;

/// Failures surfaced by the controller and router configurators
#[derive(Debug, Error)]
pub enum MappingError {
    #[error("{0}")]
    Validation(String),

    #[error("{kind} [{id}] not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{0}")]
    Configuration(String),

    #[error("persistence failure: {0}")]
    Persistence(#[from] PersistError),
}

impl MappingError {
    /// Status code used by the management API
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) | Self::Configuration(_) => 400,
            Self::NotFound { .. } => 404,
            Self::Persistence(_) => 500,
        }
    }
}

/// Route table errors
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid uri template [{0}]")]
    InvalidTemplate(String),

    #[error("route {method} {template} already registered")]
    Conflict { method: String, template: String },
}

/// Mappings file errors
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode mappings: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("failed to decode mappings: {0}")]
    Decode(#[from] toml::de::Error),

    #[error("{0}")]
    Rejected(String),
}

/// Script evaluation errors
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script engine is not configured")]
    NotConfigured,

    #[error("{0}")]
    Evaluation(String),
}
