//! Owned syntax tree model
//!
//! Tree-sitter trees borrow the source and carry FFI handles; the rest of
//! the pipeline works on this owned conversion instead. Nodes keep their
//! raw grammar kind next to the normalized `SyntaxKind` so language plugins
//! can special-case constructs the shared walker does not know about.

use serde::{Deserialize, Serialize};

use crate::shared::models::Span;

/// Language-neutral syntax kind
///
/// The per-language plugins map tree-sitter grammar kinds onto this
/// enumeration; anything without a mapping lands in `Other` and is walked
/// through transparently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyntaxKind {
    // Definitions
    FunctionDef,
    MethodDef,
    ClassDef,
    InterfaceDef,
    EnumDef,
    LambdaDef,

    // Declarations
    AssignmentStmt,
    AugAssignmentStmt,
    ParameterDecl,
    FieldDecl,
    ImportDecl,
    PackageDecl,

    // Expressions
    CallExpr,
    NameExpr,
    AttributeExpr,
    LiteralExpr,
    BinaryExpr,
    UnaryExpr,

    // Statements
    ReturnStmt,
    IfStmt,
    ForStmt,
    WhileStmt,
    TryStmt,
    WithStmt,
    BreakStmt,
    ContinueStmt,
    RaiseStmt,
    YieldExpr,

    // Other
    Decorator,
    TypeAnnotation,
    Block,
    Comment,
    Error,
    Other(String),
}

impl SyntaxKind {
    pub fn is_definition(&self) -> bool {
        matches!(
            self,
            SyntaxKind::FunctionDef
                | SyntaxKind::MethodDef
                | SyntaxKind::ClassDef
                | SyntaxKind::InterfaceDef
                | SyntaxKind::EnumDef
                | SyntaxKind::LambdaDef
        )
    }

    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            SyntaxKind::IfStmt | SyntaxKind::ForStmt | SyntaxKind::WhileStmt | SyntaxKind::TryStmt
        )
    }
}

/// Owned syntax node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    /// Raw tree-sitter grammar kind (e.g. "function_definition")
    pub raw_kind: String,
    /// Field name this node occupies in its parent, when the grammar names it
    pub field: Option<String>,
    pub span: Span,
    pub is_named: bool,
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    pub fn new(kind: SyntaxKind, raw_kind: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            raw_kind: raw_kind.into(),
            field: None,
            span,
            is_named: true,
            children: Vec::new(),
        }
    }

    /// Exact source text of this node
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }

    /// First child occupying the given grammar field
    pub fn child_by_field(&self, field: &str) -> Option<&SyntaxNode> {
        self.children
            .iter()
            .find(|c| c.field.as_deref() == Some(field))
    }

    /// First child with the given normalized kind
    pub fn child_of_kind(&self, kind: &SyntaxKind) -> Option<&SyntaxNode> {
        self.children.iter().find(|c| &c.kind == kind)
    }

    /// All children with the given raw grammar kind
    pub fn children_of_raw_kind<'a>(&'a self, raw_kind: &'a str) -> impl Iterator<Item = &'a SyntaxNode> {
        self.children.iter().filter(move |c| c.raw_kind == raw_kind)
    }

    /// Depth-first pre-order traversal
    pub fn walk(&self, visit: &mut impl FnMut(&SyntaxNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Count of nodes in this subtree
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(|c| c.subtree_size()).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: SyntaxKind, raw: &str) -> SyntaxNode {
        SyntaxNode::new(kind, raw, Span::zero())
    }

    #[test]
    fn test_child_by_field() {
        let mut parent = leaf(SyntaxKind::FunctionDef, "function_definition");
        let mut name = leaf(SyntaxKind::NameExpr, "identifier");
        name.field = Some("name".to_string());
        parent.children.push(name);

        assert!(parent.child_by_field("name").is_some());
        assert!(parent.child_by_field("body").is_none());
    }

    #[test]
    fn test_walk_visits_all() {
        let mut root = leaf(SyntaxKind::Block, "module");
        root.children.push(leaf(SyntaxKind::FunctionDef, "function_definition"));
        root.children.push(leaf(SyntaxKind::ClassDef, "class_definition"));

        let mut count = 0;
        root.walk(&mut |_| count += 1);
        assert_eq!(count, 3);
        assert_eq!(root.subtree_size(), 3);
    }
}
