use std::path::PathBuf;

use nerfuse_core::NerfuseError;
use thiserror::Error;

/// Errors raised while fetching or preparing a corpus.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or its body not read.
    #[error("request to {url} failed: {reason}")]
    Http {
        /// Requested URL.
        url: String,
        /// Underlying client error.
        reason: String,
    },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The URL has no file name to store the download under.
    #[error("cannot derive a file name from {url}")]
    InvalidUrl { url: String },

    /// An archive could not be unpacked.
    #[error("failed to extract {}: {reason}", path.display())]
    Archive { path: PathBuf, reason: String },

    /// Filesystem failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Conversion of downloaded files failed.
    #[error(transparent)]
    Core(#[from] NerfuseError),
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<FetchError> for NerfuseError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Http { url, reason } => NerfuseError::Connectivity { url, reason },
            FetchError::Status { url, status } => NerfuseError::Connectivity {
                url,
                reason: format!("HTTP {status}"),
            },
            FetchError::InvalidUrl { url } => {
                NerfuseError::InvalidConfig(format!("cannot derive a file name from {url}"))
            }
            FetchError::Archive { path, reason } => {
                NerfuseError::Archive(format!("{}: {reason}", path.display()))
            }
            FetchError::Io { path, source } => NerfuseError::Io { path, source },
            FetchError::Core(inner) => inner,
        }
    }
}

/// Result alias for fetch operations.
pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_becomes_connectivity() {
        let err: NerfuseError = FetchError::Status {
            url: "https://example.org/a.zip".into(),
            status: 404,
        }
        .into();
        match err {
            NerfuseError::Connectivity { url, reason } => {
                assert_eq!(url, "https://example.org/a.zip");
                assert_eq!(reason, "HTTP 404");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_core_error_roundtrips() {
        let err: NerfuseError = FetchError::from(NerfuseError::InvalidConfig("x".into())).into();
        assert!(err.is_configuration());
    }
}
