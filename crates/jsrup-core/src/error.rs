use crate::apis::ApiError;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for jsrup operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read '{}': {}", .path.display(), .source)]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Failed reading JSON file '{}'. Only JSON files without comments are supported at the moment: {}",
        .path.display(),
        .source
    )]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{0}")]
    Other(String),
}

impl Error {
    #[must_use]
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}
