//! Source location types
//!
//! A span carries the byte range of a construct plus the derived
//! line/column extremities. Lines are 1-based, columns 0-based
//! (tree-sitter convention). Byte offsets are authoritative: chunk text
//! must be byte-reconstructible from `start_byte..end_byte`.

use serde::{Deserialize, Serialize};

/// Single location in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Span in source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start_byte: u32,
    pub end_byte: u32,
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(
        start_byte: u32,
        end_byte: u32,
        start_line: u32,
        start_col: u32,
        end_line: u32,
        end_col: u32,
    ) -> Self {
        Self {
            start_byte,
            end_byte,
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Create a zero span (0..0, 0:0-0:0)
    pub fn zero() -> Self {
        Self::new(0, 0, 0, 0, 0, 0)
    }

    /// Build from a tree-sitter node's byte range and positions
    pub fn from_ts_node(node: &tree_sitter::Node) -> Self {
        Self {
            start_byte: node.start_byte() as u32,
            end_byte: node.end_byte() as u32,
            start_line: node.start_position().row as u32 + 1,
            start_col: node.start_position().column as u32,
            end_line: node.end_position().row as u32 + 1,
            end_col: node.end_position().column as u32,
        }
    }

    pub fn byte_len(&self) -> u32 {
        self.end_byte.saturating_sub(self.start_byte)
    }

    pub fn contains_line(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    /// Byte-range containment (inclusive start, exclusive end)
    pub fn contains(&self, other: &Span) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    pub fn line_count(&self) -> u32 {
        if self.end_line >= self.start_line {
            self.end_line - self.start_line + 1
        } else {
            0
        }
    }

    /// Slice the node's exact text out of the file source
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source
            .get(self.start_byte as usize..self.end_byte as usize)
            .unwrap_or("")
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_contains_line() {
        let span = Span::new(0, 100, 10, 0, 20, 0);
        assert!(span.contains_line(10));
        assert!(span.contains_line(15));
        assert!(span.contains_line(20));
        assert!(!span.contains_line(9));
        assert!(!span.contains_line(21));
    }

    #[test]
    fn test_span_byte_containment() {
        let outer = Span::new(0, 100, 1, 0, 10, 0);
        let inner = Span::new(20, 40, 3, 4, 5, 0);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
    }

    #[test]
    fn test_span_text_slicing() {
        let source = "def foo():\n    pass\n";
        let span = Span::new(4, 7, 1, 4, 1, 7);
        assert_eq!(span.text(source), "foo");
    }

    #[test]
    fn test_span_line_count() {
        let span = Span::new(0, 0, 10, 0, 20, 0);
        assert_eq!(span.line_count(), 11);
    }
}
