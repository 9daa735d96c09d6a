use thiserror::Error;

use crate::session::TransitionError;

/// Library errors using thiserror for structured error handling.
///
/// Only resource and I/O problems are represented here. Data gaps in log
/// lines or detection batches are absorbed with defaults and never surface
/// as errors.

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read match store: {path}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write match store: {path}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize match store")]
    Serialize(#[source] serde_json::Error),

    #[error("Match id already present in store: {0}")]
    DuplicateMatchId(uuid::Uuid),

    #[error("Invalid match: {0}")]
    InvalidMatch(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from {path}")]
    LoadFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to save configuration to {path}")]
    SaveFailed {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to create config directory: {path}")]
    DirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine user config directory")]
    NoConfigDir,
}

#[derive(Error, Debug)]
pub enum TailError {
    #[error("Failed to open log file: {path}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read log file: {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure reported by (or caught around) a plugin hook
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PluginError {
    #[error("Plugin hook failed: {0}")]
    Failed(String),

    #[error("Plugin hook panicked: {0}")]
    Panicked(String),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid session transition")]
    Transition(#[from] TransitionError),

    #[error("Failed to persist finished match")]
    Store(#[from] StoreError),
}

/// Type alias for application Results using anyhow for context chaining
pub type AppResult<T> = anyhow::Result<T>;
