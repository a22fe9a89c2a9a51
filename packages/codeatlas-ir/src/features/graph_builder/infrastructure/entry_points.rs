//! Entry-point detection
//!
//! Fixed per-language patterns: module-level `__main__` guards (hinted by
//! the IR generator), public functions named `main`, and HTTP-route / CLI
//! decorator references.

use ahash::AHashSet;

use crate::features::ir_generation::domain::IRDocument;
use crate::shared::models::{EdgeKind, NodeId, NodeKind};

use super::super::domain::GraphDocument;

/// Decorator name fragments that mark request handlers / CLI commands
const ROUTE_DECORATOR_HINTS: &[&str] = &[
    "route", "get", "post", "put", "delete", "patch", "websocket", "command", "group",
    "controller", "requestmapping", "getmapping", "postmapping",
];

pub fn detect_entry_points(graph: &GraphDocument, docs: &[IRDocument]) -> AHashSet<NodeId> {
    let mut entry_points = AHashSet::new();

    // File nodes with a module-level __main__ guard
    for doc in docs {
        if doc.entry_point_hint {
            if let Some(file) = doc.file_node() {
                entry_points.insert(file.id.clone());
            }
        }
        // main() functions: public, or in languages where `main` is the
        // process entry point regardless of casing rules
        for node in doc.function_nodes() {
            if node.name.as_deref() != Some("main") {
                continue;
            }
            let public = doc
                .signature_entities
                .iter()
                .find(|s| s.owner_node_id == node.id)
                .map(|s| s.visibility == crate::shared::models::Visibility::Public)
                .unwrap_or(true);
            let conventional = matches!(node.language.as_str(), "go" | "c" | "cpp" | "rust");
            if public || conventional {
                entry_points.insert(node.id.clone());
            }
        }
    }

    // Route/CLI decorators: DECORATES edges whose target name looks like a
    // routing or command registration
    for edge in &graph.edges {
        if edge.kind != EdgeKind::Decorates {
            continue;
        }
        let decorator_name = edge
            .attrs
            .unresolved_name
            .clone()
            .or_else(|| {
                edge.target_id
                    .as_ref()
                    .and_then(|id| graph.nodes.get(id))
                    .and_then(|n| n.name.clone())
            })
            .unwrap_or_default()
            .to_lowercase();
        let tail = decorator_name.rsplit('.').next().unwrap_or(&decorator_name);
        if ROUTE_DECORATOR_HINTS.contains(&tail) {
            // The decorated node is the edge source
            if let Some(node) = graph.nodes.get(&edge.source_id) {
                if node.kind.is_function_like() || node.kind == NodeKind::Class {
                    entry_points.insert(node.id.clone());
                }
            }
        }
    }

    entry_points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::graph_builder::infrastructure::GraphBuilder;
    use crate::features::ir_generation::IrGenerator;
    use crate::features::parsing::infrastructure::ParserRegistry;

    fn generate(file: &str, source: &str) -> IRDocument {
        let registry = ParserRegistry::with_default_plugins();
        let tree = registry.parse(file, source.as_bytes()).unwrap();
        let plugin = registry.plugin_for_path(file).unwrap();
        IrGenerator::new("repo", "snap1").generate(&tree, plugin.as_ref())
    }

    #[test]
    fn test_route_decorator_marks_handler() {
        let doc = generate(
            "api.py",
            "@app.route('/users')\ndef list_users():\n    pass\n",
        );
        let graph = GraphBuilder::new("repo", "snap1").build(&[doc]).unwrap();
        let handler = graph
            .nodes
            .values()
            .find(|n| n.name.as_deref() == Some("list_users"))
            .unwrap();
        assert!(graph.indexes.is_entry_point(&handler.id));
    }

    #[test]
    fn test_public_main_function() {
        let doc = generate("main.go", "package main\n\nfunc main() {\n}\n");
        let graph = GraphBuilder::new("repo", "snap1").build(&[doc]).unwrap();
        let main = graph
            .nodes
            .values()
            .find(|n| n.name.as_deref() == Some("main") && n.kind.is_function_like());
        if let Some(main) = main {
            assert!(graph.indexes.is_entry_point(&main.id));
        }
    }
}
