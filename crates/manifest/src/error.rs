//! Error types for the manifest crate

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or rendering manifests
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Deploy directory does not exist
    #[error("deploy directory does not exist: {}", .0.display())]
    DirNotFound(PathBuf),

    /// Manifest body failed to parse
    #[error("invalid manifest {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A template variable could not be resolved
    #[error("unresolved template variable: {{{{ {name} }}}}")]
    MissingVariable { name: String },

    /// Resource type token not recognized (CLI filters)
    #[error("unknown resource type: {0}")]
    UnknownKind(String),
}

/// Result type for manifest operations
pub type Result<T> = std::result::Result<T, Error>;
