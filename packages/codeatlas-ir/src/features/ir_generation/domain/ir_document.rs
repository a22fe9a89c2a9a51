//! IR Document - the main output of IR generation for one file

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::features::data_flow::domain::DataFlowGraph;
use crate::features::flow_graph::domain::ControlFlowGraph;
use crate::shared::models::{Edge, EdgeKind, Node, NodeId, NodeKind, SignatureEntity, Span, TypeEntity};

use super::ControlFlowSummary;

/// Current IR schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Non-fatal problem recorded against a file during IR generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrDiagnostic {
    pub message: String,
    pub span: Option<Span>,
}

/// Semantic IR attachments of one function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionSemanticIr {
    pub cfg: ControlFlowGraph,
    /// Dropped when DFG construction fails; the CFG is kept
    pub dfg: Option<DataFlowGraph>,
}

/// IR of one file within a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IRDocument {
    pub repo_id: String,
    pub snapshot_id: String,
    pub schema_version: u32,
    pub file_path: String,
    pub language: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub type_entities: Vec<TypeEntity>,
    pub signature_entities: Vec<SignatureEntity>,
    /// Advisory per-function metrics
    pub summaries: HashMap<NodeId, ControlFlowSummary>,
    /// CFG/DFG attachments keyed by function node id
    pub semantics: HashMap<NodeId, FunctionSemanticIr>,
    pub diagnostics: Vec<IrDiagnostic>,
    /// Module-level `__main__`-guard (or equivalent) seen during the walk;
    /// the graph stage combines this with name/decorator rules
    pub entry_point_hint: bool,
}

impl IRDocument {
    pub fn new(
        repo_id: impl Into<String>,
        snapshot_id: impl Into<String>,
        file_path: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
            schema_version: SCHEMA_VERSION,
            file_path: file_path.into(),
            language: language.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            type_entities: Vec::new(),
            signature_entities: Vec::new(),
            summaries: HashMap::new(),
            semantics: HashMap::new(),
            diagnostics: Vec::new(),
            entry_point_hint: false,
        }
    }

    /// The File node (every document has exactly one)
    pub fn file_node(&self) -> Option<&Node> {
        self.nodes.iter().find(|n| n.kind == NodeKind::File)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn function_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind.is_function_like())
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(move |e| e.kind == kind)
    }

    /// CONTAINS edges must form a forest: every non-root node has exactly
    /// one CONTAINS parent equal to its `parent_id`.
    pub fn validate_contains_forest(&self) -> Result<(), String> {
        let mut incoming: HashMap<&str, usize> = HashMap::new();
        for edge in self.edges_of_kind(EdgeKind::Contains) {
            let Some(target) = edge.target_id.as_deref() else {
                return Err("CONTAINS edge with no target".to_string());
            };
            *incoming.entry(target).or_insert(0) += 1;
            let node = self
                .node(target)
                .ok_or_else(|| format!("CONTAINS target {} missing", target))?;
            if node.parent_id.as_deref() != Some(edge.source_id.as_str()) {
                return Err(format!(
                    "Node {} parent_id disagrees with CONTAINS source",
                    target
                ));
            }
        }
        for node in &self.nodes {
            let count = incoming.get(node.id.as_str()).copied().unwrap_or(0);
            match (node.parent_id.is_some(), count) {
                (true, 1) | (false, 0) => {}
                (true, n) => {
                    return Err(format!("Node {} has {} CONTAINS parents", node.id, n));
                }
                (false, n) if n > 0 => {
                    return Err(format!("Root node {} has a CONTAINS parent", node.id));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
