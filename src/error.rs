use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failures that end a download invocation.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}")]
    Status { url: String, status: StatusCode },

    #[error("reading body of {url} failed: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FetchError {
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Process exit code reported for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            FetchError::Argument(_) => 2,
            FetchError::Network(_) => 3,
            FetchError::Filesystem { .. } => 4,
        }
    }
}
