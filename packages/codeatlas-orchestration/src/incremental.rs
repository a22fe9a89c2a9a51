//! Reverse-import closure for incremental runs
//!
//! A one-file edit can change cross-file resolution in every file that
//! imports it, so the incremental working set is the changed files plus
//! their transitive reverse-IMPORTS closure from the previous snapshot.

use std::collections::{HashMap, HashSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;

use codeatlas_storage::{ChunkRecord, Dependency};

/// Reverse dependency index: file → files importing it
pub struct ReverseImportIndex {
    graph: DiGraph<String, ()>,
    index_of: HashMap<String, NodeIndex>,
}

impl ReverseImportIndex {
    /// Build from (importer_file, imported_file) pairs.
    ///
    /// Edges point importee → importer so a forward BFS from a changed
    /// file reaches everything that must be re-indexed.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut graph = DiGraph::new();
        let mut index_of: HashMap<String, NodeIndex> = HashMap::new();
        let mut node = |graph: &mut DiGraph<String, ()>,
                        index_of: &mut HashMap<String, NodeIndex>,
                        name: String| {
            *index_of
                .entry(name.clone())
                .or_insert_with(|| graph.add_node(name))
        };
        for (importer, imported) in pairs {
            let importer_idx = node(&mut graph, &mut index_of, importer);
            let imported_idx = node(&mut graph, &mut index_of, imported);
            graph.update_edge(imported_idx, importer_idx, ());
        }
        Self { graph, index_of }
    }

    /// Derive the index from a previous snapshot's stored IMPORTS
    /// dependencies, mapping chunk ids back to their files.
    pub fn from_dependencies(dependencies: &[Dependency], chunks: &[ChunkRecord]) -> Self {
        let file_of: HashMap<&str, &str> = chunks
            .iter()
            .map(|c| (c.chunk_id.as_str(), c.file_path.as_str()))
            .collect();
        let pairs = dependencies
            .iter()
            .filter(|d| d.relationship == "IMPORTS")
            .filter_map(|d| {
                let from = file_of.get(d.from_chunk_id.as_str())?;
                let to = file_of.get(d.to_chunk_id.as_str())?;
                (from != to).then(|| (from.to_string(), to.to_string()))
            });
        Self::from_pairs(pairs)
    }

    /// Changed files plus every transitive importer.
    pub fn affected_files(&self, changed: &[String]) -> HashSet<String> {
        let mut affected: HashSet<String> = changed.iter().cloned().collect();
        for file in changed {
            let Some(&start) = self.index_of.get(file) else {
                continue;
            };
            let mut bfs = Bfs::new(&self.graph, start);
            while let Some(idx) = bfs.next(&self.graph) {
                affected.insert(self.graph[idx].clone());
            }
        }
        affected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(pairs: &[(&str, &str)]) -> ReverseImportIndex {
        ReverseImportIndex::from_pairs(
            pairs
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string())),
        )
    }

    #[test]
    fn test_direct_importer_affected() {
        // b imports a; changing a affects b
        let idx = index(&[("b.py", "a.py")]);
        let affected = idx.affected_files(&["a.py".to_string()]);
        assert!(affected.contains("a.py"));
        assert!(affected.contains("b.py"));
    }

    #[test]
    fn test_transitive_closure() {
        // c imports b, b imports a
        let idx = index(&[("b.py", "a.py"), ("c.py", "b.py")]);
        let affected = idx.affected_files(&["a.py".to_string()]);
        assert_eq!(affected.len(), 3);
    }

    #[test]
    fn test_unrelated_file_not_affected() {
        let idx = index(&[("b.py", "a.py"), ("d.py", "c.py")]);
        let affected = idx.affected_files(&["a.py".to_string()]);
        assert!(!affected.contains("d.py"));
        assert!(!affected.contains("c.py"));
    }

    #[test]
    fn test_import_cycle_terminates() {
        let idx = index(&[("a.py", "b.py"), ("b.py", "a.py")]);
        let affected = idx.affected_files(&["a.py".to_string()]);
        assert_eq!(affected.len(), 2);
    }

    #[test]
    fn test_changed_file_outside_graph() {
        let idx = index(&[("b.py", "a.py")]);
        let affected = idx.affected_files(&["standalone.py".to_string()]);
        assert_eq!(affected.len(), 1);
        assert!(affected.contains("standalone.py"));
    }
}
