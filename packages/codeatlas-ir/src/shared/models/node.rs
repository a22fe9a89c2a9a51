//! IR Node model
//!
//! Language-neutral node emitted by the IR generator. Nodes are owned by
//! their `IRDocument` and referenced everywhere else by id.

use serde::{Deserialize, Serialize};

use super::span::Span;
use crate::shared::utils::hash::id_hash;

/// Node kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    File,
    Module,
    Class,
    Interface,
    Enum,
    Function,
    Method,
    Lambda,
    Variable,
    Field,
    Parameter,
    Block,
    Conditional,
    Loop,
    TryCatch,
    Import,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::File => "file",
            NodeKind::Module => "module",
            NodeKind::Class => "class",
            NodeKind::Interface => "interface",
            NodeKind::Enum => "enum",
            NodeKind::Function => "function",
            NodeKind::Method => "method",
            NodeKind::Lambda => "lambda",
            NodeKind::Variable => "variable",
            NodeKind::Field => "field",
            NodeKind::Parameter => "parameter",
            NodeKind::Block => "block",
            NodeKind::Conditional => "conditional",
            NodeKind::Loop => "loop",
            NodeKind::TryCatch => "try_catch",
            NodeKind::Import => "import",
        }
    }

    /// Function-like nodes carry signatures and semantic IR
    pub fn is_function_like(&self) -> bool {
        matches!(self, NodeKind::Function | NodeKind::Method | NodeKind::Lambda)
    }

    /// Type-declaring nodes (resolution targets for INHERITS/IMPLEMENTS/REFERENCES)
    pub fn is_type_like(&self) -> bool {
        matches!(self, NodeKind::Class | NodeKind::Interface | NodeKind::Enum)
    }
}

/// Coarse semantic role, derived heuristically by the graph builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Controller,
    Service,
    Repository,
    Model,
    Test,
    Util,
    Config,
}

impl NodeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Controller => "controller",
            NodeRole::Service => "service",
            NodeRole::Repository => "repository",
            NodeRole::Model => "model",
            NodeRole::Test => "test",
            NodeRole::Util => "util",
            NodeRole::Config => "config",
        }
    }
}

/// IR Node
///
/// # Identity
///
/// `id` is a pure function of `(repo_id, file_path, kind, fqn, span,
/// content_hash)`: the same logical entity gets the same id across re-runs
/// over identical content, and a new id as soon as its text changes.
/// Identical content moved to a new path gets a new id (the path
/// participates), but `content_hash` is exposed so callers can detect moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// None for anonymous nodes (lambdas, synthetic blocks)
    pub name: Option<String>,
    /// Dot-joined scope path; None for anonymous nodes
    pub fqn: Option<String>,
    /// Relative to repo root
    pub file_path: String,
    pub span: Span,
    pub body_span: Option<Span>,
    pub language: String,
    /// Dotted module path of the enclosing file (e.g. "myapp.services.user")
    pub module_path: Option<String>,
    /// Tree parent (source of the incoming CONTAINS edge)
    pub parent_id: Option<String>,
    /// SHA-256 of the exact source text in `span`
    pub content_hash: String,
    pub docstring: Option<String>,
    pub role: Option<NodeRole>,
    pub is_test_file: bool,
    /// Attached SignatureEntity id (function-like nodes)
    pub signature_id: Option<String>,
    /// Attached TypeEntity id (annotated variables/fields/parameters)
    pub declared_type_id: Option<String>,
}

impl Node {
    /// Compute the stable node id from its identity fields.
    ///
    /// Key layout: `{kind}:{repo_id}:{file_path}:{fqn}:{start}-{end}:{content_hash}`.
    /// The span component makes overloads with identical FQNs distinct.
    pub fn compute_id(
        repo_id: &str,
        file_path: &str,
        kind: NodeKind,
        fqn: Option<&str>,
        span: &Span,
        content_hash: &str,
    ) -> String {
        let key = format!(
            "{}:{}:{}:{}:{}-{}:{}",
            kind.as_str(),
            repo_id,
            file_path,
            fqn.unwrap_or(""),
            span.start_byte,
            span.end_byte,
            content_hash
        );
        id_hash(&key)
    }

    pub fn new(
        id: String,
        kind: NodeKind,
        file_path: String,
        span: Span,
        language: String,
        content_hash: String,
    ) -> Self {
        Self {
            id,
            kind,
            name: None,
            fqn: None,
            file_path,
            span,
            body_span: None,
            language,
            module_path: None,
            parent_id: None,
            content_hash,
            docstring: None,
            role: None,
            is_test_file: false,
            signature_id: None,
            declared_type_id: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_fqn(mut self, fqn: impl Into<String>) -> Self {
        self.fqn = Some(fqn.into());
        self
    }

    pub fn with_module_path(mut self, module_path: impl Into<String>) -> Self {
        self.module_path = Some(module_path.into());
        self
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_body_span(mut self, body_span: Span) -> Self {
        self.body_span = Some(body_span);
        self
    }

    pub fn with_docstring(mut self, docstring: impl Into<String>) -> Self {
        self.docstring = Some(docstring.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span() -> Span {
        Span::new(0, 24, 1, 0, 2, 8)
    }

    #[test]
    fn test_id_stability() {
        let a = Node::compute_id("repo", "src/a.py", NodeKind::Function, Some("a.foo"), &span(), "h1");
        let b = Node::compute_id("repo", "src/a.py", NodeKind::Function, Some("a.foo"), &span(), "h1");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn test_id_changes_with_content() {
        let a = Node::compute_id("repo", "src/a.py", NodeKind::Function, Some("a.foo"), &span(), "h1");
        let b = Node::compute_id("repo", "src/a.py", NodeKind::Function, Some("a.foo"), &span(), "h2");
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_changes_with_path() {
        // Same content moved to a new path produces a new id
        let a = Node::compute_id("repo", "src/a.py", NodeKind::Function, Some("a.foo"), &span(), "h1");
        let b = Node::compute_id("repo", "src/b.py", NodeKind::Function, Some("a.foo"), &span(), "h1");
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_distinguishes_overloads_by_span() {
        let s1 = Span::new(0, 24, 1, 0, 2, 8);
        let s2 = Span::new(30, 60, 4, 0, 6, 8);
        let a = Node::compute_id("repo", "A.java", NodeKind::Method, Some("A.f"), &s1, "h");
        let b = Node::compute_id("repo", "A.java", NodeKind::Method, Some("A.f"), &s2, "h");
        assert_ne!(a, b);
    }

    #[test]
    fn test_function_like() {
        assert!(NodeKind::Function.is_function_like());
        assert!(NodeKind::Method.is_function_like());
        assert!(NodeKind::Lambda.is_function_like());
        assert!(!NodeKind::Class.is_function_like());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Same identity fields always hash to the same id
            #[test]
            fn prop_id_deterministic(
                repo in "[a-z]{1,8}",
                path in "[a-z][a-z/]{0,15}",
                fqn in "[a-z][a-z.]{0,15}",
                hash in "[0-9a-f]{8,16}",
            ) {
                let span = Span::new(0, 10, 1, 0, 2, 0);
                let a = Node::compute_id(&repo, &path, NodeKind::Function, Some(&fqn), &span, &hash);
                let b = Node::compute_id(&repo, &path, NodeKind::Function, Some(&fqn), &span, &hash);
                prop_assert_eq!(a, b);
            }

            /// Different content hashes never collide on the same id
            #[test]
            fn prop_content_participates_in_identity(
                hash_a in "[0-9a-f]{16}",
                hash_b in "[0-9a-f]{16}",
            ) {
                prop_assume!(hash_a != hash_b);
                let span = Span::new(0, 10, 1, 0, 2, 0);
                let a = Node::compute_id("r", "m.py", NodeKind::Function, Some("m.f"), &span, &hash_a);
                let b = Node::compute_id("r", "m.py", NodeKind::Function, Some("m.f"), &span, &hash_b);
                prop_assert_ne!(a, b);
            }
        }
    }
}
