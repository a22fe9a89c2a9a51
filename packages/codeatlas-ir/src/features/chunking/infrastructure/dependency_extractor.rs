//! Chunk-level dependency extraction
//!
//! Projects resolved graph edges (CALLS, IMPORTS, INHERITS, IMPLEMENTS,
//! DATA_FLOW) onto the chunk hierarchy: each endpoint maps to its smallest
//! containing chunk.

use std::collections::{HashMap, HashSet};

use crate::features::graph_builder::domain::GraphDocument;
use crate::shared::models::EdgeKind;

use super::super::domain::{ChunkDependency, ChunkId, ChunkToIr};

/// Edge kinds that become chunk dependencies
const DEPENDENCY_KINDS: &[EdgeKind] = &[
    EdgeKind::Calls,
    EdgeKind::Imports,
    EdgeKind::Inherits,
    EdgeKind::Implements,
    EdgeKind::DataFlow,
];

pub struct DependencyExtractor;

impl DependencyExtractor {
    /// Derive chunk dependencies from the snapshot graph.
    ///
    /// `chunk_sizes` orders candidate chunks per node so each node maps to
    /// its smallest containing chunk (function before class before file).
    pub fn extract(
        graph: &GraphDocument,
        chunk_to_ir: &ChunkToIr,
        chunk_sizes: &HashMap<ChunkId, u32>,
    ) -> Vec<ChunkDependency> {
        // node id → smallest containing chunk
        let mut node_to_chunk: HashMap<&str, &str> = HashMap::new();
        for (chunk_id, node_ids) in chunk_to_ir {
            let size = chunk_sizes.get(chunk_id).copied().unwrap_or(u32::MAX);
            for node_id in node_ids {
                match node_to_chunk.get(node_id.as_str()) {
                    Some(current)
                        if chunk_sizes.get(*current).copied().unwrap_or(u32::MAX) <= size => {}
                    _ => {
                        node_to_chunk.insert(node_id, chunk_id);
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        let mut deps = Vec::new();
        for edge in &graph.edges {
            if !DEPENDENCY_KINDS.contains(&edge.kind) {
                continue;
            }
            let Some(target_id) = edge.target_id.as_deref() else {
                continue;
            };
            let (Some(from_chunk), Some(to_chunk)) = (
                node_to_chunk.get(edge.source_id.as_str()),
                node_to_chunk.get(target_id),
            ) else {
                continue;
            };
            if from_chunk == to_chunk {
                continue;
            }
            let dep = ChunkDependency::new(*from_chunk, *to_chunk, edge.kind.as_str(), 1.0);
            if seen.insert(dep.id.clone()) {
                deps.push(dep);
            }
        }
        deps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::chunking::infrastructure::ChunkBuilder;
    use crate::features::graph_builder::infrastructure::GraphBuilder;
    use crate::features::ir_generation::IrGenerator;
    use crate::features::parsing::infrastructure::ParserRegistry;

    #[test]
    fn test_cross_file_call_becomes_dependency() {
        let registry = ParserRegistry::with_default_plugins();
        let gen = IrGenerator::new("repo", "snap1");
        let chunker = ChunkBuilder::new("repo", "snap1");

        let mut chunk_to_ir = ChunkToIr::new();
        let mut chunk_sizes = HashMap::new();
        let mut docs = Vec::new();

        for (file, source) in [
            ("a.py", "def foo():\n    pass\n"),
            ("b.py", "from a import foo\n\ndef bar():\n    foo()\n"),
        ] {
            let tree = registry.parse(file, source.as_bytes()).unwrap();
            let plugin = registry.plugin_for_path(file).unwrap();
            let doc = gen.generate(&tree, plugin.as_ref());
            let chunks = chunker.build_file(&doc, &tree.source).unwrap();
            for chunk in &chunks.chunks {
                chunk_sizes.insert(chunk.chunk_id.clone(), chunk.line_count());
            }
            chunk_to_ir.extend(chunks.chunk_to_ir);
            docs.push(doc);
        }

        let graph = GraphBuilder::new("repo", "snap1").build(&docs).unwrap();
        let deps = DependencyExtractor::extract(&graph, &chunk_to_ir, &chunk_sizes);

        let call_dep = deps.iter().find(|d| d.relationship == "CALLS").unwrap();
        assert_eq!(call_dep.from_chunk_id, "chunk:repo:function:b.bar");
        assert_eq!(call_dep.to_chunk_id, "chunk:repo:function:a.foo");
        assert_eq!(call_dep.confidence, 1.0);
    }
}
