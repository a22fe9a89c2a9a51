//! Cross-file reference resolution
//!
//! Unresolved edges carry the name they failed to bind: either an imported
//! FQN ("a.foo", alias-resolution already applied by the IR builder) or a
//! bare name. The resolver looks both up in a symbol index keyed by
//! (module_path, name); hits set `target_id` and drop the unresolved flag,
//! misses stay unresolved and are treated as external by consumers.

use ahash::AHashMap;

use crate::shared::models::{Edge, NodeId};

use super::super::domain::GraphDocument;

pub struct CrossFileResolver {
    /// (module_path, name) → node id
    symbols: AHashMap<(String, String), NodeId>,
    /// Full FQN → node id (inner classes, dotted method paths)
    by_fqn: AHashMap<String, NodeId>,
    /// node id → module path of its file (for bare-name lookups)
    module_of: AHashMap<NodeId, String>,
}

impl CrossFileResolver {
    pub fn from_graph(graph: &GraphDocument) -> Self {
        let mut symbols = AHashMap::new();
        let mut by_fqn = AHashMap::new();
        let mut module_of = AHashMap::new();

        // Sorted for deterministic tie-breaking when two files declare the
        // same symbol
        let mut nodes: Vec<_> = graph.nodes.values().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        for node in nodes {
            if let Some(module) = &node.module_path {
                module_of.insert(node.id.clone(), module.clone());
            }
            // Import nodes are references to elsewhere, never resolution
            // targets
            if node.kind == crate::shared::models::NodeKind::Import {
                continue;
            }
            if let (Some(module), Some(name)) = (&node.module_path, &node.name) {
                symbols
                    .entry((module.clone(), name.clone()))
                    .or_insert_with(|| node.id.clone());
            }
            if let Some(fqn) = &node.fqn {
                by_fqn.entry(fqn.clone()).or_insert_with(|| node.id.clone());
            }
        }

        Self {
            symbols,
            by_fqn,
            module_of,
        }
    }

    /// Repair unresolved edges in place; returns the number repaired.
    pub fn resolve(&self, edges: &mut [Edge]) -> usize {
        let mut repaired = 0;
        for edge in edges.iter_mut() {
            if edge.target_id.is_some() {
                continue;
            }
            let Some(name) = edge.attrs.unresolved_name.clone() else {
                continue;
            };
            if let Some(target) = self.lookup(&name, &edge.source_id) {
                edge.target_id = Some(target);
                edge.attrs.unresolved_name = None;
                repaired += 1;
            }
        }
        repaired
    }

    fn lookup(&self, name: &str, source_id: &str) -> Option<NodeId> {
        // Exact FQN first ("a.foo", "com.example.Outer.Inner")
        if let Some(id) = self.by_fqn.get(name) {
            return Some(id.clone());
        }
        // Dotted name split into (module, symbol)
        if let Some((module, symbol)) = name.rsplit_once('.') {
            if let Some(id) = self.symbols.get(&(module.to_string(), symbol.to_string())) {
                return Some(id.clone());
            }
        }
        // Bare name against the source node's own module
        if !name.contains('.') {
            if let Some(module) = self.module_of.get(source_id) {
                if let Some(id) = self.symbols.get(&(module.clone(), name.to_string())) {
                    return Some(id.clone());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{EdgeKind, Node, NodeKind, Span};
    use crate::shared::utils::hash::content_hash;

    fn make_node(file: &str, module: &str, name: &str, kind: NodeKind) -> Node {
        let span = Span::zero();
        let hash = content_hash(name);
        let fqn = format!("{}.{}", module, name);
        let id = Node::compute_id("repo", file, kind, Some(&fqn), &span, &hash);
        Node::new(id, kind, file.to_string(), span, "python".to_string(), hash)
            .with_name(name)
            .with_fqn(fqn)
            .with_module_path(module)
    }

    #[test]
    fn test_resolve_dotted_name() {
        let mut graph = GraphDocument::new("repo", "snap");
        let target = make_node("a.py", "a", "foo", NodeKind::Function);
        let caller = make_node("b.py", "b", "bar", NodeKind::Function);
        let target_id = target.id.clone();
        graph.nodes.insert(target.id.clone(), target);
        graph.nodes.insert(caller.id.clone(), caller.clone());

        let mut edges = vec![Edge::unresolved(
            EdgeKind::Calls,
            caller.id.clone(),
            "a.foo".to_string(),
            Span::zero(),
        )];

        let resolver = CrossFileResolver::from_graph(&graph);
        let repaired = resolver.resolve(&mut edges);
        assert_eq!(repaired, 1);
        assert_eq!(edges[0].target_id.as_deref(), Some(target_id.as_str()));
        assert!(edges[0].attrs.unresolved_name.is_none());
    }

    #[test]
    fn test_bare_name_resolves_in_same_module() {
        let mut graph = GraphDocument::new("repo", "snap");
        let target = make_node("a.py", "a", "helper", NodeKind::Function);
        let caller = make_node("a.py", "a", "main", NodeKind::Function);
        graph.nodes.insert(target.id.clone(), target.clone());
        graph.nodes.insert(caller.id.clone(), caller.clone());

        let mut edges = vec![Edge::unresolved(
            EdgeKind::Calls,
            caller.id.clone(),
            "helper".to_string(),
            Span::zero(),
        )];

        let resolver = CrossFileResolver::from_graph(&graph);
        assert_eq!(resolver.resolve(&mut edges), 1);
        assert_eq!(edges[0].target_id.as_deref(), Some(target.id.as_str()));
    }

    #[test]
    fn test_external_name_stays_unresolved() {
        let mut graph = GraphDocument::new("repo", "snap");
        let caller = make_node("a.py", "a", "main", NodeKind::Function);
        graph.nodes.insert(caller.id.clone(), caller.clone());

        let mut edges = vec![Edge::unresolved(
            EdgeKind::Calls,
            caller.id,
            "os.path.join".to_string(),
            Span::zero(),
        )];

        let resolver = CrossFileResolver::from_graph(&graph);
        assert_eq!(resolver.resolve(&mut edges), 0);
        assert!(edges[0].target_id.is_none());
        assert_eq!(edges[0].attrs.unresolved_name.as_deref(), Some("os.path.join"));
    }
}
