use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Missing or unusable configuration. Raised before any I/O happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
}

/// Upstream network or payload failure during a fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed for {context}: {source}")]
    Request {
        context: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unexpected payload from {context}: {reason}")]
    Payload { context: String, reason: String },
    #[error("{context} returned no observations")]
    Empty { context: String },
}

impl FetchError {
    pub(crate) fn request(context: impl Into<String>, source: reqwest::Error) -> Self {
        FetchError::Request {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn payload(context: impl Into<String>, reason: impl Into<String>) -> Self {
        FetchError::Payload {
            context: context.into(),
            reason: reason.into(),
        }
    }
}

/// I/O failure reading or writing the snapshot file.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read snapshot at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write snapshot at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot at {path} is not decodable: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("snapshot could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A selected period that no return can be computed over.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidPeriodError {
    #[error("no observations between {start} and {end}")]
    Empty { start: NaiveDate, end: NaiveDate },
    #[error("rolling window must cover at least one year")]
    ZeroWindow,
}

/// Anything that can abort a sync. The stored snapshot is left untouched
/// whenever one of these is returned.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
