//! Graph builder domain models
//!
//! The repository-wide heterogeneous graph: the union of per-file IR with
//! reverse and by-kind adjacency indexes for O(1) consumer queries.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared::models::{Edge, EdgeKind, Node, NodeId, NodeKind};

/// Reverse and adjacency indexes over the merged graph
#[derive(Debug, Clone, Default)]
pub struct GraphIndex {
    /// Function → callers
    pub called_by: AHashMap<NodeId, Vec<NodeId>>,
    /// Module/symbol → importers
    pub imported_by: AHashMap<NodeId, Vec<NodeId>>,
    /// Parent → children (CONTAINS)
    pub contains_children: AHashMap<NodeId, Vec<NodeId>>,
    /// (node, kind) → targets
    pub outgoing_by_kind: AHashMap<(NodeId, EdgeKind), Vec<NodeId>>,
    /// (node, kind) → sources
    pub incoming_by_kind: AHashMap<(NodeId, EdgeKind), Vec<NodeId>>,
    /// Nodes detected as entry points
    pub entry_points: AHashSet<NodeId>,
}

impl GraphIndex {
    pub fn get_callers(&self, function_id: &str) -> &[NodeId] {
        self.called_by
            .get(function_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_importers(&self, node_id: &str) -> &[NodeId] {
        self.imported_by
            .get(node_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_children(&self, parent_id: &str) -> &[NodeId] {
        self.contains_children
            .get(parent_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn outgoing(&self, node_id: &str, kind: EdgeKind) -> &[NodeId] {
        self.outgoing_by_kind
            .get(&(node_id.to_string(), kind))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_entry_point(&self, node_id: &str) -> bool {
        self.entry_points.contains(node_id)
    }
}

/// Repository-wide graph for one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub repo_id: String,
    pub snapshot_id: String,
    /// All nodes, indexed by id
    pub nodes: AHashMap<NodeId, Node>,
    /// All edges, cross-file-resolved where possible
    pub edges: Vec<Edge>,
    /// file_path → node ids
    pub path_index: AHashMap<String, AHashSet<NodeId>>,
    #[serde(skip)]
    pub indexes: GraphIndex,
}

impl GraphDocument {
    pub fn new(repo_id: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
            nodes: AHashMap::new(),
            edges: Vec::new(),
            path_index: AHashMap::new(),
            indexes: GraphIndex::default(),
        }
    }

    pub fn get_node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn nodes_by_kind(&self, kind: NodeKind) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.kind == kind).collect()
    }

    pub fn edges_by_kind(&self, kind: EdgeKind) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.kind == kind).collect()
    }

    pub fn node_ids_for_path(&self, file_path: &str) -> Option<&AHashSet<NodeId>> {
        self.path_index.get(file_path)
    }

    pub fn unresolved_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.target_id.is_none())
    }

    /// Rebuild all indexes from nodes/edges (after merge or deserialize)
    pub fn rebuild_indexes(&mut self) {
        let mut indexes = GraphIndex {
            entry_points: std::mem::take(&mut self.indexes.entry_points),
            ..Default::default()
        };
        for edge in &self.edges {
            let Some(target) = edge.target_id.as_ref() else {
                continue;
            };
            indexes
                .outgoing_by_kind
                .entry((edge.source_id.clone(), edge.kind))
                .or_default()
                .push(target.clone());
            indexes
                .incoming_by_kind
                .entry((target.clone(), edge.kind))
                .or_default()
                .push(edge.source_id.clone());
            match edge.kind {
                EdgeKind::Calls => indexes
                    .called_by
                    .entry(target.clone())
                    .or_default()
                    .push(edge.source_id.clone()),
                EdgeKind::Imports => indexes
                    .imported_by
                    .entry(target.clone())
                    .or_default()
                    .push(edge.source_id.clone()),
                EdgeKind::Contains => indexes
                    .contains_children
                    .entry(edge.source_id.clone())
                    .or_default()
                    .push(target.clone()),
                _ => {}
            }
        }
        self.indexes = indexes;
    }

    pub fn stats(&self) -> GraphStats {
        let mut nodes_by_kind = HashMap::new();
        for node in self.nodes.values() {
            *nodes_by_kind.entry(node.kind).or_insert(0) += 1;
        }
        let mut edges_by_kind = HashMap::new();
        let mut unresolved_edges = 0;
        for edge in &self.edges {
            *edges_by_kind.entry(edge.kind).or_insert(0) += 1;
            if edge.target_id.is_none() {
                unresolved_edges += 1;
            }
        }
        GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            unresolved_edges,
            nodes_by_kind,
            edges_by_kind,
        }
    }
}

/// Merge/resolution statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub unresolved_edges: usize,
    pub nodes_by_kind: HashMap<NodeKind, usize>,
    pub edges_by_kind: HashMap<EdgeKind, usize>,
}
