//! Parsing: language detection and syntax trees

pub mod domain;
pub mod infrastructure;
pub mod plugins;
pub mod ports;

pub use domain::{ParseDiagnostic, ParsedTree, SyntaxKind, SyntaxNode};
pub use infrastructure::ParserRegistry;
pub use ports::{LanguageId, LanguagePlugin};
