//! Importance scoring via damped random walk
//!
//! Classic PageRank (Page et al., 1998) on the graph restricted to
//! CALLS ∪ IMPORTS ∪ INHERITS ∪ IMPLEMENTS, uniform teleport vector:
//!
//! ```text
//! PR(v) = (1-d)/N + d * Σ(PR(u) / outdegree(u))
//!                       u→v
//! ```
//!
//! Convergence: at most `max_iterations` or L1 residual below `tolerance`.
//! Scores are normalized so the snapshot maximum is 1.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::features::graph_builder::domain::GraphDocument;
use crate::shared::models::NodeId;

/// PageRank configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRankSettings {
    /// Damping factor, range (0, 1)
    pub damping: f64,
    pub max_iterations: usize,
    /// L1 residual threshold
    pub tolerance: f64,
}

impl Default for PageRankSettings {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

impl PageRankSettings {
    pub fn with_damping(damping: f64) -> Self {
        Self {
            damping,
            ..Default::default()
        }
    }
}

/// PageRank engine over the snapshot graph
pub struct PageRankEngine {
    settings: PageRankSettings,
}

impl PageRankEngine {
    pub fn new(settings: PageRankSettings) -> Self {
        Self { settings }
    }

    /// Compute normalized importance per node id.
    ///
    /// Only importance-bearing edges (CALLS/IMPORTS/INHERITS/IMPLEMENTS)
    /// with resolved targets participate; every node of the graph gets a
    /// score so unconnected nodes receive the teleport baseline.
    pub fn compute(&self, graph: &GraphDocument) -> HashMap<NodeId, f64> {
        if graph.nodes.is_empty() {
            return HashMap::new();
        }

        // Deterministic node ordering for stable iteration
        let mut node_ids: Vec<&str> = graph.nodes.keys().map(|s| s.as_str()).collect();
        node_ids.sort();
        let index_of: HashMap<&str, usize> =
            node_ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let n = node_ids.len();

        // Restricted adjacency: incoming lists + outdegrees
        let mut incoming: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut outdegree: Vec<usize> = vec![0; n];
        for edge in &graph.edges {
            if !edge.kind.affects_importance() {
                continue;
            }
            let Some(target) = edge.target_id.as_deref() else {
                continue;
            };
            let (Some(&source_idx), Some(&target_idx)) = (
                index_of.get(edge.source_id.as_str()),
                index_of.get(target),
            ) else {
                continue;
            };
            incoming[target_idx].push(source_idx);
            outdegree[source_idx] += 1;
        }

        let damping = self.settings.damping;
        let base = (1.0 - damping) / n as f64;
        let mut scores = vec![1.0 / n as f64; n];

        for iteration in 0..self.settings.max_iterations {
            let mut next = vec![0.0; n];
            // Dangling mass is redistributed uniformly
            let dangling: f64 = scores
                .iter()
                .enumerate()
                .filter(|(i, _)| outdegree[*i] == 0)
                .map(|(_, s)| s)
                .sum();
            let dangling_share = damping * dangling / n as f64;

            let mut residual = 0.0;
            for (idx, next_score) in next.iter_mut().enumerate() {
                let incoming_sum: f64 = incoming[idx]
                    .iter()
                    .map(|&src| scores[src] / outdegree[src] as f64)
                    .sum();
                *next_score = base + dangling_share + damping * incoming_sum;
                residual += (*next_score - scores[idx]).abs();
            }
            scores = next;

            if residual < self.settings.tolerance {
                debug!(iterations = iteration + 1, "pagerank converged");
                break;
            }
        }

        // Normalize so max = 1
        let max = scores.iter().copied().fold(f64::MIN, f64::max);
        if max > 0.0 {
            for score in &mut scores {
                *score /= max;
            }
        }

        node_ids
            .into_iter()
            .zip(scores)
            .map(|(id, score)| (id.to_string(), score))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Edge, EdgeKind, Node, NodeKind, Span};

    fn graph_with_calls(calls: &[(&str, &str)]) -> GraphDocument {
        let mut graph = GraphDocument::new("repo", "snap");
        let mut all = std::collections::HashSet::new();
        for (a, b) in calls {
            all.insert(*a);
            all.insert(*b);
        }
        for name in all {
            let node = Node::new(
                name.to_string(),
                NodeKind::Function,
                "m.py".to_string(),
                Span::zero(),
                "python".to_string(),
                "h".to_string(),
            );
            graph.nodes.insert(name.to_string(), node);
        }
        for (a, b) in calls {
            graph.edges.push(Edge::resolved(
                EdgeKind::Calls,
                a.to_string(),
                b.to_string(),
                Span::zero(),
            ));
        }
        graph
    }

    #[test]
    fn test_hub_scores_highest() {
        // Everyone calls `core`; it must dominate
        let graph = graph_with_calls(&[("a", "core"), ("b", "core"), ("c", "core"), ("a", "b")]);
        let scores = PageRankEngine::new(PageRankSettings::default()).compute(&graph);

        assert_eq!(scores.get("core").copied(), Some(1.0));
        assert!(scores["core"] > scores["a"]);
        assert!(scores["core"] > scores["b"]);
    }

    #[test]
    fn test_max_normalized_to_one() {
        let graph = graph_with_calls(&[("a", "b"), ("b", "c")]);
        let scores = PageRankEngine::new(PageRankSettings::default()).compute(&graph);
        let max = scores.values().copied().fold(f64::MIN, f64::max);
        assert!((max - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_graph() {
        let graph = GraphDocument::new("repo", "snap");
        let scores = PageRankEngine::new(PageRankSettings::default()).compute(&graph);
        assert!(scores.is_empty());
    }

    #[test]
    fn test_contains_edges_do_not_affect_importance() {
        let mut graph = graph_with_calls(&[("a", "b")]);
        // Add a CONTAINS edge pointing at `a`; scores must not change from it
        graph.edges.push(Edge::resolved(
            EdgeKind::Contains,
            "b".to_string(),
            "a".to_string(),
            Span::zero(),
        ));
        let scores = PageRankEngine::new(PageRankSettings::default()).compute(&graph);
        assert!(scores["b"] > scores["a"]);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let graph = graph_with_calls(&[("a", "b"), ("c", "b"), ("b", "d")]);
        let engine = PageRankEngine::new(PageRankSettings::default());
        let s1 = engine.compute(&graph);
        let s2 = engine.compute(&graph);
        assert_eq!(s1, s2);
    }
}
