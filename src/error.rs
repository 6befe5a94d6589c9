//! Error handling types and utilities.

use std::path::PathBuf;

/// A specialized Result type for process-level glue.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods. Domain operations return the typed errors below.
pub type Result<T> = anyhow::Result<T>;

/// A single document that could not be normalized.
///
/// Parse failures never abort a batch; they are collected into the
/// [`BuildReport`](crate::builder::BuildReport).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, thiserror::Error)]
#[error("failed to parse '{path}': {reason}")]
pub struct ParseFailure {
    pub path: String,
    pub reason: ParseFailureReason,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, thiserror::Error)]
pub enum ParseFailureReason {
    #[error("document is empty")]
    Empty,
    #[error("front matter opened with '---' but never closed")]
    UnterminatedFrontMatter,
    #[error("invalid front matter: {0}")]
    InvalidFrontMatter(String),
}

/// The document source could not produce a new batch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("`{command}` failed: {stderr}")]
    Git { command: String, stderr: String },
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("documentation root {} does not exist", .0.display())]
    MissingRoot(PathBuf),
}

/// A rebuilt index could not be committed. The previous index keeps serving.
#[derive(Debug, thiserror::Error)]
pub enum BuildFailure {
    #[error("failed to persist index to {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode index snapshot: {0}")]
    Encode(#[from] postcard::Error),
    #[error("index preparation task failed: {0}")]
    Prepare(#[source] tokio::task::JoinError),
    #[error("index commit task failed: {0}")]
    Commit(#[from] tokio::task::JoinError),
}

/// Failure of the `refresh` operation as seen by its caller.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    #[error("a refresh is already in progress")]
    InProgress,
    #[error("refresh was cancelled before the new index was committed")]
    Cancelled,
    #[error("could not fetch documents: {0}")]
    Fetch(#[from] FetchError),
    #[error("could not rebuild index: {0}")]
    Build(#[from] BuildFailure),
}

/// Errors raised by read-only query operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("invalid {field}: {constraint}")]
    InvalidInput {
        field: &'static str,
        constraint: String,
    },
}

impl QueryError {
    pub(crate) fn invalid(field: &'static str, constraint: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            constraint: constraint.into(),
        }
    }
}

/// Loading a persisted snapshot failed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read index snapshot {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode index snapshot: {0}")]
    Decode(#[from] postcard::Error),
    #[error("snapshot format version {found} is not supported (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error("snapshot projections disagree on '{0}'")]
    ProjectionMismatch(String),
}
