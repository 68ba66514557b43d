//! Error types for the drivepath library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for drivepath operations.
#[derive(Error, Debug)]
pub enum DriveError {
    /// Credentials are missing or invalid, or the token exchange failed.
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// A folder segment could not be found or created.
    #[error("Failed to resolve folder '{segment}': {source}")]
    Resolve {
        segment: String,
        #[source]
        source: Box<DriveError>,
    },

    /// Upload or download stream failure.
    #[error("Transfer failed: {0}")]
    Transfer(String),

    /// The remote node does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Local file missing or inaccessible.
    #[error("Local I/O error on {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Caller supplied an empty or malformed argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Drive API returned an error payload.
    #[error("API error {status} ({reason}): {message}")]
    Api {
        status: u16,
        reason: String,
        message: String,
    },

    /// Network request error.
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No response within the configured request timeout.
    #[error("HTTP request timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Invalid or unexpected response from server.
    #[error("Invalid response from server")]
    InvalidResponse,

    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

/// Coarse classification of a [`DriveError`], used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Resolve,
    Transfer,
    NotFound,
    LocalIo,
    Other,
}

impl DriveError {
    /// Classify this error into the coarse taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DriveError::Auth(_) => ErrorKind::Auth,
            DriveError::Resolve { .. } => ErrorKind::Resolve,
            DriveError::Transfer(_) | DriveError::Timeout(_) => ErrorKind::Transfer,
            DriveError::NotFound(_) => ErrorKind::NotFound,
            DriveError::LocalIo { .. } => ErrorKind::LocalIo,
            DriveError::Api { status: 401, .. } => ErrorKind::Auth,
            DriveError::Api { status: 404, .. } => ErrorKind::NotFound,
            _ => ErrorKind::Other,
        }
    }

    pub(crate) fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DriveError::LocalIo {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for drivepath operations.
pub type Result<T> = std::result::Result<T, DriveError>;
