//! Chunk importance assignment
//!
//! Copies normalized PageRank scores from graph nodes onto the chunks that
//! cover them; a chunk scores as the best of its covered nodes.

use std::collections::HashMap;

use crate::features::chunking::domain::{Chunk, ChunkLevel, ChunkToIr};
use crate::shared::models::NodeId;

pub fn assign_importance(
    chunks: &mut [Chunk],
    chunk_to_ir: &ChunkToIr,
    scores: &HashMap<NodeId, f64>,
) {
    for chunk in chunks.iter_mut() {
        if chunk.level == ChunkLevel::Repo {
            chunk.importance = 1.0;
            continue;
        }
        // Primary node first, covered nodes as fallback
        let primary = chunk
            .attrs
            .get("node_id")
            .and_then(|v| v.as_str())
            .and_then(|id| scores.get(id))
            .copied();
        let best_covered = chunk_to_ir
            .get(&chunk.chunk_id)
            .map(|node_ids| {
                node_ids
                    .iter()
                    .filter_map(|id| scores.get(id))
                    .copied()
                    .fold(0.0, f64::max)
            })
            .unwrap_or(0.0);
        chunk.importance = primary.unwrap_or(best_covered).max(best_covered) as f32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    fn chunk(id: &str, node_id: &str) -> Chunk {
        let mut attrs = Map::new();
        attrs.insert("node_id".to_string(), Value::String(node_id.to_string()));
        Chunk {
            chunk_id: id.to_string(),
            repo_id: "r".to_string(),
            snapshot_id: "s".to_string(),
            file_path: "m.py".to_string(),
            start_line: 1,
            end_line: 5,
            kind: ChunkLevel::Function.chunk_kind(),
            level: ChunkLevel::Function,
            fqn: "m.f".to_string(),
            language: "python".to_string(),
            content: String::new(),
            content_hash: "h".to_string(),
            summary: None,
            importance: 0.0,
            is_deleted: false,
            attrs,
        }
    }

    #[test]
    fn test_primary_node_score_wins() {
        let mut chunks = vec![chunk("c1", "n1")];
        let mut chunk_to_ir = ChunkToIr::new();
        chunk_to_ir.insert("c1".to_string(), vec!["n1".to_string(), "n2".to_string()]);
        let mut scores = HashMap::new();
        scores.insert("n1".to_string(), 0.7);
        scores.insert("n2".to_string(), 0.3);

        assign_importance(&mut chunks, &chunk_to_ir, &scores);
        assert!((chunks[0].importance - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_covered_node_beats_low_primary() {
        let mut chunks = vec![chunk("c1", "n1")];
        let mut chunk_to_ir = ChunkToIr::new();
        chunk_to_ir.insert("c1".to_string(), vec!["n1".to_string(), "n2".to_string()]);
        let mut scores = HashMap::new();
        scores.insert("n1".to_string(), 0.2);
        scores.insert("n2".to_string(), 0.9);

        assign_importance(&mut chunks, &chunk_to_ir, &scores);
        assert!((chunks[0].importance - 0.9).abs() < 1e-6);
    }
}
