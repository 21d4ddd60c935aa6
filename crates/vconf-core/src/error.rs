//! Error taxonomy for registry operations.
//!
//! Every variant is handled at the operation boundary (reload, save, create,
//! export) and reported to the operator. None of them is process-fatal.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the core.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A node kind could not produce a zero-value instance.
    #[error("Cannot instantiate config kind '{kind}': {reason}")]
    Instantiation { kind: String, reason: String },

    /// A stored file does not decode into an instance of its declared kind.
    #[error("Failed to parse config file {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// An instance has no usable backing directory, or the chosen
    /// destination cannot hold a config file.
    #[error("Cannot resolve config path {}: {reason}", path.display())]
    PathResolution { path: PathBuf, reason: String },

    #[error("Unknown config kind: {0}")]
    UnknownKind(String),

    #[error("Invalid config kind name: '{0}'")]
    InvalidKindName(String),

    #[error("Config kind '{0}' is already registered")]
    DuplicateKind(String),

    /// Create was requested for a singleton (global) kind.
    #[error("Config kind '{0}' is global and cannot be created")]
    NotNodeKind(String),

    /// An `Id` was assigned to an instance of a global kind.
    #[error("Configs of a global kind have no Id")]
    GlobalKindId,

    /// The handle belongs to an older discovery pass.
    #[error("Instance handle is stale; reload before using it")]
    StaleHandle,

    #[error("Failed to serialize config '{kind}': {source}")]
    Serialize {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A collaborator (destination prompt, clipboard) failed.
    #[error("{0}")]
    Collaborator(#[from] anyhow::Error),
}

impl RegistryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn path_resolution(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::PathResolution {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
