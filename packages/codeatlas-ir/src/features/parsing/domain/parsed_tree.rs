//! Parsed tree with best-effort error recovery
//!
//! A parse that hits error nodes still yields a tree; the error regions are
//! surfaced as diagnostics and downstream stages treat those nodes as
//! opaque text.

use serde::{Deserialize, Serialize};

use super::syntax_node::SyntaxNode;
use crate::shared::models::Span;

/// A parse diagnostic (error or missing node reported by the grammar)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseDiagnostic {
    pub message: String,
    pub span: Span,
}

/// Result of parsing one file
#[derive(Debug, Clone)]
pub struct ParsedTree {
    pub root: SyntaxNode,
    pub source: String,
    pub file_path: String,
    pub language: String,
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl ParsedTree {
    pub fn new(root: SyntaxNode, source: String, file_path: String, language: String) -> Self {
        Self {
            root,
            source,
            file_path,
            language,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<ParseDiagnostic>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
