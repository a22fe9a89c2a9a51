//! IR Edge model
//!
//! Edges are first-class entities, never arrays on nodes. An edge whose
//! target could not be resolved keeps `target_id = None` together with
//! `attrs.unresolved_name`; the graph builder may repair it during
//! cross-file linkage.

use serde::{Deserialize, Serialize};

use super::span::Span;

/// Edge kind enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    Contains,
    Calls,
    Reads,
    Writes,
    Imports,
    Inherits,
    Implements,
    Decorates,
    References,
    Throws,
    RouteTo,
    UsesRepo,
    DataFlow,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Contains => "CONTAINS",
            EdgeKind::Calls => "CALLS",
            EdgeKind::Reads => "READS",
            EdgeKind::Writes => "WRITES",
            EdgeKind::Imports => "IMPORTS",
            EdgeKind::Inherits => "INHERITS",
            EdgeKind::Implements => "IMPLEMENTS",
            EdgeKind::Decorates => "DECORATES",
            EdgeKind::References => "REFERENCES",
            EdgeKind::Throws => "THROWS",
            EdgeKind::RouteTo => "ROUTE_TO",
            EdgeKind::UsesRepo => "USES_REPO",
            EdgeKind::DataFlow => "DATA_FLOW",
        }
    }

    /// Kinds that participate in chunk importance scoring
    pub fn affects_importance(&self) -> bool {
        matches!(
            self,
            EdgeKind::Calls | EdgeKind::Imports | EdgeKind::Inherits | EdgeKind::Implements
        )
    }
}

/// Kind-specific edge metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeAttrs {
    /// Set when the target could not be bound; the referenced identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresolved_name: Option<String>,
    /// Import alias ("import numpy as np" → "np")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Call argument count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg_count: Option<u32>,
    /// "from x import y" style import
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_from_import: Option<bool>,
    /// Imported module path, for IMPORTS edges
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imported_module: Option<String>,
}

impl EdgeAttrs {
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self {
            unresolved_name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// IR Edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub kind: EdgeKind,
    pub source_id: String,
    /// None when resolution failed (unresolved edge)
    pub target_id: Option<String>,
    /// Where the relation appears in source
    pub span: Span,
    #[serde(default, skip_serializing_if = "EdgeAttrs::is_empty")]
    pub attrs: EdgeAttrs,
}

impl Edge {
    /// Deterministic edge id: no counters, so two runs emit identical ids.
    /// The target slot falls back to the unresolved name for unbound edges.
    pub fn compute_id(kind: EdgeKind, source_id: &str, target: &str, span: &Span) -> String {
        format!(
            "edge:{}:{}:{}:{}",
            kind.as_str(),
            source_id,
            target,
            span.start_byte
        )
    }

    pub fn resolved(kind: EdgeKind, source_id: String, target_id: String, span: Span) -> Self {
        let id = Self::compute_id(kind, &source_id, &target_id, &span);
        Self {
            id,
            kind,
            source_id,
            target_id: Some(target_id),
            span,
            attrs: EdgeAttrs::default(),
        }
    }

    pub fn unresolved(kind: EdgeKind, source_id: String, name: String, span: Span) -> Self {
        let id = Self::compute_id(kind, &source_id, &name, &span);
        Self {
            id,
            kind,
            source_id,
            target_id: None,
            span,
            attrs: EdgeAttrs::unresolved(name),
        }
    }

    pub fn with_attrs(mut self, attrs: EdgeAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.target_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_id_deterministic() {
        let span = Span::new(10, 20, 2, 0, 2, 10);
        let a = Edge::resolved(EdgeKind::Calls, "src".into(), "dst".into(), span);
        let b = Edge::resolved(EdgeKind::Calls, "src".into(), "dst".into(), span);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_unresolved_edge() {
        let span = Span::zero();
        let edge = Edge::unresolved(EdgeKind::Calls, "caller".into(), "helper".into(), span);
        assert!(!edge.is_resolved());
        assert_eq!(edge.attrs.unresolved_name.as_deref(), Some("helper"));
    }

    #[test]
    fn test_importance_kinds() {
        assert!(EdgeKind::Calls.affects_importance());
        assert!(EdgeKind::Imports.affects_importance());
        assert!(EdgeKind::Inherits.affects_importance());
        assert!(EdgeKind::Implements.affects_importance());
        assert!(!EdgeKind::Contains.affects_importance());
        assert!(!EdgeKind::Reads.affects_importance());
    }
}
