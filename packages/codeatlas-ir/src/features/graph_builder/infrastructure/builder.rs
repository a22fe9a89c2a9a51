//! Graph builder - the per-snapshot reducer
//!
//! Merges per-file IR into one graph, then runs cross-file resolution,
//! entry-point detection, and role tagging. An id collision during merge
//! indicates an id-hash violation and is fatal.

use ahash::AHashSet;
use tracing::info;

use crate::features::ir_generation::domain::IRDocument;
use crate::shared::models::{CodeatlasError, Result};

use super::super::domain::GraphDocument;
use super::cross_file_resolver::CrossFileResolver;
use super::entry_points::detect_entry_points;
use super::role_tagger::tag_roles;

/// Reducer from per-file IR documents to the snapshot graph
pub struct GraphBuilder {
    repo_id: String,
    snapshot_id: String,
}

impl GraphBuilder {
    pub fn new(repo_id: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
        }
    }

    pub fn build(&self, docs: &[IRDocument]) -> Result<GraphDocument> {
        let mut graph = GraphDocument::new(&self.repo_id, &self.snapshot_id);

        // 1. Union of per-file collections
        for doc in docs {
            for node in &doc.nodes {
                if let Some(existing) = graph.nodes.get(&node.id) {
                    return Err(CodeatlasError::merge_collision(format!(
                        "Node id {} emitted by both {} and {}",
                        node.id, existing.file_path, node.file_path
                    )));
                }
                graph
                    .path_index
                    .entry(node.file_path.clone())
                    .or_insert_with(AHashSet::new)
                    .insert(node.id.clone());
                graph.nodes.insert(node.id.clone(), node.clone());
            }
            graph.edges.extend(doc.edges.iter().cloned());
        }

        // 2. Cross-file resolution of unresolved edges
        let resolver = CrossFileResolver::from_graph(&graph);
        let repaired = resolver.resolve(&mut graph.edges);

        // 3. Entry points
        let entry_points = detect_entry_points(&graph, docs);
        graph.indexes.entry_points = entry_points;

        // 4. Roles
        tag_roles(&mut graph);

        graph.rebuild_indexes();

        let stats = graph.stats();
        info!(
            nodes = stats.total_nodes,
            edges = stats.total_edges,
            repaired,
            unresolved = stats.unresolved_edges,
            "graph built"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir_generation::IrGenerator;
    use crate::features::parsing::infrastructure::ParserRegistry;
    use crate::shared::models::{EdgeKind, ErrorKind, NodeKind};

    fn generate(file: &str, source: &str) -> IRDocument {
        let registry = ParserRegistry::with_default_plugins();
        let tree = registry.parse(file, source.as_bytes()).unwrap();
        let plugin = registry.plugin_for_path(file).unwrap();
        IrGenerator::new("repo", "snap1").generate(&tree, plugin.as_ref())
    }

    #[test]
    fn test_cross_file_call_resolution() {
        let a = generate("a.py", "def foo():\n    pass\n");
        let b = generate("b.py", "from a import foo\n\nfoo()\n");

        let graph = GraphBuilder::new("repo", "snap1").build(&[a, b]).unwrap();

        let foo_id = graph
            .nodes
            .values()
            .find(|n| n.kind == NodeKind::Function && n.name.as_deref() == Some("foo"))
            .map(|n| n.id.clone())
            .unwrap();

        let call = graph
            .edges
            .iter()
            .find(|e| e.kind == EdgeKind::Calls)
            .unwrap();
        assert_eq!(call.target_id.as_deref(), Some(foo_id.as_str()));
        assert!(call.attrs.unresolved_name.is_none());
    }

    #[test]
    fn test_unresolvable_stays_unresolved() {
        let b = generate("b.py", "import numpy\n\nnumpy.zeros(3)\n");
        let graph = GraphBuilder::new("repo", "snap1").build(&[b]).unwrap();

        // External call survives as unresolved, not dropped
        assert!(graph.unresolved_edges().any(|e| e.kind == EdgeKind::Calls));
    }

    #[test]
    fn test_merge_collision_is_fatal() {
        let a = generate("a.py", "def foo():\n    pass\n");
        let duplicate = a.clone();
        let err = GraphBuilder::new("repo", "snap1")
            .build(&[a, duplicate])
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::GraphMergeCollision);
    }

    #[test]
    fn test_entry_point_main_guard() {
        let main = generate(
            "cli.py",
            "def main():\n    pass\n\nif __name__ == '__main__':\n    main()\n",
        );
        let graph = GraphBuilder::new("repo", "snap1").build(&[main]).unwrap();

        let file_id = graph
            .nodes
            .values()
            .find(|n| n.kind == NodeKind::File)
            .map(|n| n.id.clone())
            .unwrap();
        assert!(graph.indexes.is_entry_point(&file_id));
    }

    #[test]
    fn test_cross_file_inheritance_resolution() {
        let base = generate("base.py", "class Base:\n    pass\n");
        let child = generate(
            "child.py",
            "from base import Base\n\nclass Child(Base):\n    pass\n",
        );
        let graph = GraphBuilder::new("repo", "snap1")
            .build(&[base, child])
            .unwrap();

        let inherits = graph
            .edges
            .iter()
            .find(|e| e.kind == EdgeKind::Inherits)
            .unwrap();
        assert!(inherits.is_resolved());
    }

    #[test]
    fn test_index_rebuild() {
        let a = generate("a.py", "def foo():\n    pass\n");
        let b = generate("b.py", "from a import foo\n\nfoo()\n");
        let graph = GraphBuilder::new("repo", "snap1").build(&[a, b]).unwrap();

        let foo_id = graph
            .nodes
            .values()
            .find(|n| n.kind == NodeKind::Function)
            .map(|n| n.id.clone())
            .unwrap();
        assert_eq!(graph.indexes.get_callers(&foo_id).len(), 1);
    }
}
