//! RepoMap domain models

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Level of a node in the RepoMap tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoMapLevel {
    Repo,
    Module,
    File,
    Class,
    Function,
}

/// Node in the RepoMap tree
///
/// # Invariants
///
/// 1. `parent_id` is None only for the repo root
/// 2. `children_ids` reference nodes of the same snapshot
/// 3. The tree is acyclic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMapNode {
    /// `map:{repo_id}:{level}:{path-or-fqn}`
    pub id: String,
    pub level: RepoMapLevel,
    pub name: String,
    pub parent_id: Option<String>,
    pub children_ids: Vec<String>,
    /// Template-generated one-liner (an LLM summarizer may replace it)
    pub summary: String,
    /// Copied from the backing chunk
    pub importance: f32,
    /// Originating chunk id, when the node is chunk-backed
    pub chunk_id: Option<String>,
    /// Originating IR node id, when available
    pub node_id: Option<String>,
    pub file_path: Option<String>,
}

impl RepoMapNode {
    pub fn is_leaf(&self) -> bool {
        self.children_ids.is_empty()
    }
}

/// The navigable RepoMap of one snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoMap {
    pub repo_id: String,
    pub snapshot_id: String,
    pub root_id: String,
    pub nodes: HashMap<String, RepoMapNode>,
}

impl RepoMap {
    pub fn root(&self) -> Option<&RepoMapNode> {
        self.nodes.get(&self.root_id)
    }

    pub fn get(&self, id: &str) -> Option<&RepoMapNode> {
        self.nodes.get(id)
    }

    pub fn children(&self, id: &str) -> Vec<&RepoMapNode> {
        self.nodes
            .get(id)
            .map(|n| {
                n.children_ids
                    .iter()
                    .filter_map(|c| self.nodes.get(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Most important nodes at a level, descending
    pub fn top_by_importance(&self, level: RepoMapLevel, limit: usize) -> Vec<&RepoMapNode> {
        let mut nodes: Vec<&RepoMapNode> =
            self.nodes.values().filter(|n| n.level == level).collect();
        nodes.sort_by(|a, b| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        nodes.truncate(limit);
        nodes
    }

    /// Tree integrity: root exists, parents exist, no cycles
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        if !self.nodes.contains_key(&self.root_id) {
            errors.push(format!("root {} missing", self.root_id));
        }
        for node in self.nodes.values() {
            if let Some(parent) = &node.parent_id {
                if !self.nodes.contains_key(parent) {
                    errors.push(format!("node {} references missing parent {}", node.id, parent));
                }
            } else if node.id != self.root_id {
                errors.push(format!("non-root node {} has no parent", node.id));
            }
        }
        // Cycle check by walking up from every node
        for node in self.nodes.values() {
            let mut cursor = node.parent_id.as_ref();
            let mut hops = 0;
            while let Some(parent) = cursor {
                hops += 1;
                if hops > self.nodes.len() {
                    errors.push(format!("cycle through {}", node.id));
                    break;
                }
                cursor = self.nodes.get(parent).and_then(|p| p.parent_id.as_ref());
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
