//! Error taxonomy shared by both pipelines.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PorterError {
    /// Bad or missing arguments, detected before any network call.
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Failed to load {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    #[error("Cannot access file {path}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Non-2xx answer from the platform.
    #[error("Platform returned {status}: {body}")]
    Remote { status: u16, body: String },

    /// 2xx answer from the platform that lacks an expected field.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Transfer to storage failed: {0}")]
    Transfer(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Packaging failed: {0}")]
    Packaging(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type PorterResult<T> = Result<T, PorterError>;

impl PorterError {
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PorterError::FileAccess {
            path: path.into(),
            source,
        }
    }
}
