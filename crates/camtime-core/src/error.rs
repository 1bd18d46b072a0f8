use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;

/// Filename does not follow the camera naming grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("filename does not carry a capture timestamp: {filename}")]
pub struct ParseError {
    pub filename: String,
}

impl ParseError {
    pub fn new(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
        }
    }
}

/// The metadata service itself could not produce a key/value mapping.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("`{tool}` is not available: {source}")]
    Unavailable {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{tool}` exited with {status}: {stderr}")]
    Failed {
        tool: String,
        status: String,
        stderr: String,
    },
    #[error("unreadable metadata output: {0}")]
    Output(String),
    #[error("malformed media container: {0}")]
    Container(String),
}

/// Metadata could not be turned into a capture timestamp.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("none of the expected metadata fields are present ({})", .keys.join(", "))]
    MissingField { keys: Vec<&'static str> },
    #[error("metadata field {key} holds an unparseable date: {value:?}")]
    Format { key: &'static str, value: String },
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Filename and metadata timestamps disagree beyond tolerance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("filename date {filename_date} and metadata date {metadata_date} differ by {drift}s")]
pub struct ConsistencyError {
    pub filename_date: NaiveDateTime,
    pub metadata_date: NaiveDateTime,
    pub drift: i64,
}

/// Setting the modification time failed.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("{date} does not exist in the local timezone")]
    NonexistentLocalTime { date: NaiveDateTime },
    #[error("failed to set mtime on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Walking a root directory failed.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot walk {}: {source}", .root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}
