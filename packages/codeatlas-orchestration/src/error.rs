//! Orchestrator error types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Retry classification for failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// I/O, resource contention: retried with backoff
    Transient,
    /// Syntax errors, unsupported languages: never retried
    Permanent,
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Stage {stage} failed: {message}")]
    StageFailed { stage: String, message: String },

    #[error("Stage {stage} exceeded its {budget_secs}s budget")]
    Timeout { stage: String, budget_secs: u64 },

    #[error("Run cancelled")]
    Cancelled,

    #[error(transparent)]
    Ir(#[from] codeatlas_ir::CodeatlasError),

    #[error(transparent)]
    Storage(#[from] codeatlas_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl OrchestratorError {
    /// Retry classification; storage and plain IO problems are transient,
    /// everything syntax- or config-shaped is permanent.
    pub fn category(&self) -> ErrorCategory {
        match self {
            OrchestratorError::Io(_) | OrchestratorError::Storage(_) => ErrorCategory::Transient,
            OrchestratorError::Ir(err) if err.kind == codeatlas_ir::ErrorKind::Io => {
                ErrorCategory::Transient
            }
            _ => ErrorCategory::Permanent,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_is_transient() {
        let err = OrchestratorError::Io(std::io::Error::new(
            std::io::ErrorKind::Interrupted,
            "interrupted",
        ));
        assert_eq!(err.category(), ErrorCategory::Transient);
    }

    #[test]
    fn test_parse_is_permanent() {
        let err = OrchestratorError::Ir(codeatlas_ir::CodeatlasError::parse("bad token"));
        assert_eq!(err.category(), ErrorCategory::Permanent);
    }

    #[test]
    fn test_display_includes_stage() {
        let err = OrchestratorError::StageFailed {
            stage: "Graph".to_string(),
            message: "id collision".to_string(),
        };
        assert!(err.to_string().contains("Graph"));
    }
}
