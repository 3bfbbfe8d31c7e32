//! Error types for retrofuzz.
//!
//! Matching itself never fails: a label without a match is a normal outcome
//! (see [`crate::model::SkipReason`]). Errors here describe bad configuration
//! and collaborator failures (filesystem, network, remote catalog).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the retrofuzz library.
#[derive(Debug, Error)]
pub enum RetrofuzzError {
    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Not found: {url}")]
    NotFound { url: String },

    #[error("Download failed for {url}: {message}")]
    DownloadFailed { url: String, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    // Remote catalog errors
    #[error("Catalog unavailable for {category}: {message}")]
    CatalogUnavailable { category: String, message: String },

    #[error("Unknown system: {name}")]
    UnknownSystem { name: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Playlist errors
    #[error("Unknown playlist: {name}")]
    UnknownPlaylist { name: String },

    #[error("Playlist {path} has no labels")]
    EmptyPlaylist { path: PathBuf },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid glob pattern {pattern:?}: {message}")]
    InvalidGlob { pattern: String, message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for retrofuzz operations.
pub type Result<T> = std::result::Result<T, RetrofuzzError>;

impl From<std::io::Error> for RetrofuzzError {
    fn from(err: std::io::Error) -> Self {
        RetrofuzzError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for RetrofuzzError {
    fn from(err: serde_json::Error) -> Self {
        RetrofuzzError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for RetrofuzzError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RetrofuzzError::Timeout(std::time::Duration::from_secs(0))
        } else {
            RetrofuzzError::Network {
                message: err.to_string(),
                source: Some(err),
            }
        }
    }
}

impl RetrofuzzError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        RetrofuzzError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        RetrofuzzError::Config {
            message: message.into(),
        }
    }

    /// Check if this error should trigger a retry.
    ///
    /// Only the download executor retries; the matching core never does.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RetrofuzzError::Network { .. } | RetrofuzzError::Timeout(_)
        )
    }
}
