use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building a unified NER dataset.
#[derive(Debug, Error)]
pub enum NerfuseError {
    /// The requested dataset name is not a known preset.
    #[error("unknown dataset: {name:?}")]
    UnknownDataset {
        /// The name that was requested.
        name: String,
    },

    /// A file referenced by the configuration does not exist.
    #[error("file not found: {}", path.display())]
    MissingFile {
        /// The path that could not be found.
        path: PathBuf,
    },

    /// A frozen vocabulary has to coerce a label but contains no `O` entry.
    #[error("frozen label vocabulary has no \"O\" label to coerce {label:?} into")]
    MissingOutsideLabel {
        /// The label that could not be coerced.
        label: String,
    },

    /// A configuration file could not be interpreted.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A closed sentence has a different number of tokens and labels.
    #[error("{}:{line}: sentence has {tokens} tokens but {labels} labels", path.display())]
    SentenceLengthMismatch {
        /// Source of the sentence.
        path: PathBuf,
        /// Line number at which the sentence was closed.
        line: usize,
        /// Number of tokens in the sentence.
        tokens: usize,
        /// Number of labels in the sentence.
        labels: usize,
    },

    /// A token matrix and a tag matrix do not line up.
    #[error("token/tag mismatch at {}: {tokens} tokens vs {tags} tags", row.map_or_else(|| "top level".to_string(), |r| format!("row {r}")))]
    PairLengthMismatch {
        /// Row at which the mismatch was found, `None` for the outer length.
        row: Option<usize>,
        /// Length on the token side.
        tokens: usize,
        /// Length on the tag side.
        tags: usize,
    },

    /// Metadata dates do not pair up with decoded sentences.
    #[error("{}: {dates} metadata dates for {sentences} sentences", path.display())]
    DateCountMismatch {
        /// Source file.
        path: PathBuf,
        /// Number of dates recorded.
        dates: usize,
        /// Number of sentences decoded.
        sentences: usize,
    },

    /// A record is structurally invalid.
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    /// Downloading an archive failed.
    #[error("failed to fetch {url}: {reason}")]
    Connectivity {
        /// The URL being fetched.
        url: String,
        /// Underlying failure.
        reason: String,
    },

    /// An archive could not be extracted.
    #[error("archive error: {0}")]
    Archive(String),

    /// An I/O operation on a specific path failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),
}

impl NerfuseError {
    /// Wraps an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for errors raised by invalid configuration, before decoding.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownDataset { .. }
                | Self::MissingFile { .. }
                | Self::MissingOutsideLabel { .. }
                | Self::InvalidConfig(_)
        )
    }

    /// Returns `true` for errors raised by structurally invalid input data.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::SentenceLengthMismatch { .. }
                | Self::PairLengthMismatch { .. }
                | Self::DateCountMismatch { .. }
                | Self::MalformedRecord(_)
        )
    }
}

/// Result type alias for nerfuse operations.
pub type Result<T> = std::result::Result<T, NerfuseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = NerfuseError::UnknownDataset {
            name: "conll2099".into(),
        };
        assert!(err.to_string().contains("conll2099"));

        let err = NerfuseError::PairLengthMismatch {
            row: Some(3),
            tokens: 4,
            tags: 5,
        };
        assert_eq!(err.to_string(), "token/tag mismatch at row 3: 4 tokens vs 5 tags");

        let err = NerfuseError::PairLengthMismatch {
            row: None,
            tokens: 1,
            tags: 2,
        };
        assert!(err.to_string().contains("top level"));
    }

    #[test]
    fn error_kinds() {
        assert!(NerfuseError::MissingFile { path: "x".into() }.is_configuration());
        assert!(NerfuseError::MalformedRecord("x".into()).is_malformed());
        assert!(!NerfuseError::Archive("x".into()).is_malformed());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NerfuseError>();
    }
}
