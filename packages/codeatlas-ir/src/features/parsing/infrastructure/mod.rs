//! Parsing infrastructure (tree-sitter lives here)

mod registry;

pub use registry::ParserRegistry;
