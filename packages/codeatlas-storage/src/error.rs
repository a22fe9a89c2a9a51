//! Error types for codeatlas-storage

use std::fmt;
use thiserror::Error;

/// Storage error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Database errors (SQLite)
    Database,
    /// Serialization/deserialization errors
    Serialization,
    /// Snapshot not found
    SnapshotNotFound,
    /// Chunk not found
    ChunkNotFound,
    /// Write to an existing snapshot id (snapshots are immutable)
    SnapshotExists,
    /// Transaction errors
    Transaction,
    /// I/O errors
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Database => "database",
            ErrorKind::Serialization => "serialization",
            ErrorKind::SnapshotNotFound => "snapshot_not_found",
            ErrorKind::ChunkNotFound => "chunk_not_found",
            ErrorKind::SnapshotExists => "snapshot_exists",
            ErrorKind::Transaction => "transaction",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Storage error type
#[derive(Debug, Error)]
#[error("[{kind}] {message}")]
pub struct StorageError {
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    pub kind: ErrorKind,
    pub message: String,
}

impl StorageError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Serialization, message)
    }

    pub fn snapshot_not_found(snapshot_id: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::SnapshotNotFound,
            format!("Snapshot not found: {}", snapshot_id.into()),
        )
    }

    pub fn chunk_not_found(chunk_id: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::ChunkNotFound,
            format!("Chunk not found: {}", chunk_id.into()),
        )
    }

    pub fn snapshot_exists(snapshot_id: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::SnapshotExists,
            format!("Snapshot already exists: {}", snapshot_id.into()),
        )
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transaction, message)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::database(format!("SQLite error: {}", err)).with_source(err)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::serialization(format!("JSON error: {}", err)).with_source(err)
    }
}

impl<T> From<std::sync::PoisonError<T>> for StorageError {
    fn from(_err: std::sync::PoisonError<T>) -> Self {
        StorageError::transaction("Connection mutex poisoned")
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::snapshot_not_found("abc123");
        let msg = format!("{}", err);
        assert!(msg.contains("snapshot_not_found"));
        assert!(msg.contains("abc123"));
    }

    #[test]
    fn test_snapshot_exists() {
        let err = StorageError::snapshot_exists("abc");
        assert_eq!(err.kind, ErrorKind::SnapshotExists);
    }

    #[test]
    fn test_result_propagation() {
        fn inner() -> Result<()> {
            Err(StorageError::chunk_not_found("c1"))
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        assert_eq!(outer().unwrap_err().kind, ErrorKind::ChunkNotFound);
    }
}
