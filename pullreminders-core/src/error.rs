//! Error types for pullreminders

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for credential and settings operations
#[derive(Error, Debug)]
pub enum Error {
    /// The credential file does not exist yet
    #[error("Credential file not found at {}", .path.display())]
    NotFound { path: PathBuf },

    /// Reading or writing a file failed
    #[error("IO error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A persisted file could not be decoded
    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// Attempted to store a credential with an empty field
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error means the credential has never been stored
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Classify a read failure, keeping a missing file distinct from other IO errors
    pub(crate) fn on_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound { path: path.into() }
        } else {
            Error::Io {
                path: path.into(),
                source,
            }
        }
    }
}
