//! Error types shared by the pipeline stages.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while running the ETL pipeline.
///
/// A resolution miss is not an error: it surfaces as `None` from the
/// resolver and ends up as NULL references in the songplay row.
#[derive(Debug, Error)]
pub enum EtlError {
    /// The root directory of a phase could not be walked.
    #[error("Cannot discover files under {path}: {reason}")]
    DiscoveryFailure { path: PathBuf, reason: String },

    /// A discovered file could not be read.
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content does not match the expected record shape.
    #[error("Malformed record in {path}: {source}")]
    MalformedRecord {
        path: PathBuf,
        #[source]
        source: RecordError,
    },

    /// The store rejected a statement.
    #[error("Storage failure ({context}): {source}")]
    StorageWriteFailure {
        context: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl EtlError {
    pub fn malformed(path: impl Into<PathBuf>, source: RecordError) -> Self {
        EtlError::MalformedRecord {
            path: path.into(),
            source,
        }
    }

    pub fn is_malformed_record(&self) -> bool {
        matches!(self, EtlError::MalformedRecord { .. })
    }
}

/// Shape errors found while decoding or projecting records.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("line {line}: {source}")]
    InvalidLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("event #{event} has no value for `{field}`")]
    MissingField { event: usize, field: &'static str },

    #[error("event #{event} has an out of range timestamp {ts}")]
    TimestampOutOfRange { event: usize, ts: i64 },
}

pub(crate) trait StorageResultExt<T> {
    fn storage_context<S: Into<String>>(self, context: S) -> Result<T, EtlError>;
}

impl<T> StorageResultExt<T> for rusqlite::Result<T> {
    fn storage_context<S: Into<String>>(self, context: S) -> Result<T, EtlError> {
        self.map_err(|source| EtlError::StorageWriteFailure {
            context: context.into(),
            source,
        })
    }
}
