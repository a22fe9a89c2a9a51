//! Error types for the codeatlas-ir crate
//!
//! Unified error handling across all features: categorized kinds matching
//! the pipeline stages, optional file/line context, and source chaining.

use std::fmt;

/// Error kind categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Parsing errors
    Parse,
    /// Unknown file extension
    UnsupportedLanguage,
    /// IR generation errors
    IrGeneration,
    /// Name resolution failure, usually downgraded to an unresolved edge
    NameResolution,
    /// CFG/DFG construction errors
    CfgBuild,
    /// Graph merge collision: indicates an id-hash violation, fatal
    GraphMergeCollision,
    /// Chunk span outside its file node: invariant violation, fatal
    ChunkSpanOutOfFile,
    /// Configuration errors
    Config,
    /// IO errors
    Io,
    /// Internal errors (bugs)
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::UnsupportedLanguage => "unsupported_language",
            ErrorKind::IrGeneration => "ir_generation",
            ErrorKind::NameResolution => "name_resolution",
            ErrorKind::CfgBuild => "cfg_build",
            ErrorKind::GraphMergeCollision => "graph_merge_collision",
            ErrorKind::ChunkSpanOutOfFile => "chunk_span_out_of_file",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
            ErrorKind::Internal => "internal",
        }
    }

    /// Fatal kinds abort the whole run; everything else is file- or
    /// function-scoped and recovers by skipping.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorKind::GraphMergeCollision | ErrorKind::ChunkSpanOutOfFile | ErrorKind::Internal
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unified error type
#[derive(Debug)]
pub struct CodeatlasError {
    pub kind: ErrorKind,
    pub message: String,
    pub file_path: Option<String>,
    pub line: Option<u32>,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CodeatlasError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file_path: None,
            line: None,
            source: None,
        }
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // Convenience constructors
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn unsupported_language(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedLanguage, message)
    }

    pub fn ir_generation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IrGeneration, message)
    }

    pub fn name_resolution(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NameResolution, message)
    }

    pub fn cfg_build(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CfgBuild, message)
    }

    pub fn merge_collision(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GraphMergeCollision, message)
    }

    pub fn chunk_span(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ChunkSpanOutOfFile, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl fmt::Display for CodeatlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.message)?;
        if let Some(ref file) = self.file_path {
            write!(f, " in {}", file)?;
            if let Some(line) = self.line {
                write!(f, ":{}", line)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for CodeatlasError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for CodeatlasError {
    fn from(err: std::io::Error) -> Self {
        CodeatlasError::new(ErrorKind::Io, format!("IO error: {}", err)).with_source(err)
    }
}

impl From<serde_json::Error> for CodeatlasError {
    fn from(err: serde_json::Error) -> Self {
        CodeatlasError::internal(format!("JSON serialization error: {}", err)).with_source(err)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, CodeatlasError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CodeatlasError::parse("unexpected token")
            .with_file("test.py")
            .with_line(42);

        let msg = format!("{}", err);
        assert!(msg.contains("parse"));
        assert!(msg.contains("unexpected token"));
        assert!(msg.contains("test.py"));
        assert!(msg.contains("42"));
    }

    #[test]
    fn test_fatal_kinds() {
        assert!(ErrorKind::GraphMergeCollision.is_fatal());
        assert!(ErrorKind::ChunkSpanOutOfFile.is_fatal());
        assert!(!ErrorKind::Parse.is_fatal());
        assert!(!ErrorKind::CfgBuild.is_fatal());
    }
}
