//! Chunk data model
//!
//! Symbol-first hierarchical chunking for retrieval.
//!
//! Hierarchy:
//!     Repo → File → Class → Function
//!
//! Leaf chunks carry the exact source text of their span (byte
//! reconstructible); parent chunks carry a bounded excerpt.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Leaf or parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Leaf,
    Parent,
}

/// Granularity level within the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkLevel {
    Function,
    Class,
    Module,
    File,
    Repo,
}

impl ChunkLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChunkLevel::Function => "function",
            ChunkLevel::Class => "class",
            ChunkLevel::Module => "module",
            ChunkLevel::File => "file",
            ChunkLevel::Repo => "repo",
        }
    }

    pub fn chunk_kind(&self) -> ChunkKind {
        match self {
            ChunkLevel::Function => ChunkKind::Leaf,
            _ => ChunkKind::Parent,
        }
    }
}

/// A retrieval chunk
///
/// # ID format
/// `chunk:{repo_id}:{level}:{fqn}`, with `:{start}-{end}` appended when
/// overloads collide on the same FQN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub repo_id: String,
    pub snapshot_id: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub kind: ChunkKind,
    pub level: ChunkLevel,
    pub fqn: String,
    pub language: String,
    /// Source text (exact for leaves, bounded excerpt for parents)
    pub content: String,
    pub content_hash: String,
    pub summary: Option<String>,
    /// Graph-centrality importance in [0, 1]
    pub importance: f32,
    pub is_deleted: bool,
    /// Children ids, docstring, referenced node ids, signature hash
    pub attrs: Map<String, Value>,
}

impl Chunk {
    pub fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    pub fn is_leaf(&self) -> bool {
        self.kind == ChunkKind::Leaf
    }

    pub fn children(&self) -> Vec<String> {
        self.attrs
            .get("children")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn add_child(&mut self, child_id: &str) {
        let children = self
            .attrs
            .entry("children")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(arr) = children {
            if !arr.iter().any(|v| v.as_str() == Some(child_id)) {
                arr.push(Value::String(child_id.to_string()));
            }
        }
    }

    /// IR node ids whose spans lie within this chunk
    pub fn node_ids(&self) -> Vec<String> {
        self.attrs
            .get("node_ids")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn signature_hash(&self) -> Option<&str> {
        self.attrs.get("signature_hash").and_then(|v| v.as_str())
    }
}

/// Chunk-level dependency persisted alongside chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkDependency {
    pub id: String,
    pub from_chunk_id: String,
    pub to_chunk_id: String,
    /// CALLS / IMPORTS / INHERITS / IMPLEMENTS / DATA_FLOW / ...
    pub relationship: String,
    pub confidence: f32,
}

impl ChunkDependency {
    pub fn new(
        from_chunk_id: impl Into<String>,
        to_chunk_id: impl Into<String>,
        relationship: impl Into<String>,
        confidence: f32,
    ) -> Self {
        let from_chunk_id = from_chunk_id.into();
        let to_chunk_id = to_chunk_id.into();
        let relationship = relationship.into();
        Self {
            id: format!("dep:{}:{}:{}", relationship, from_chunk_id, to_chunk_id),
            from_chunk_id,
            to_chunk_id,
            relationship,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(level: ChunkLevel) -> Chunk {
        Chunk {
            chunk_id: "chunk:r:function:m.f".to_string(),
            repo_id: "r".to_string(),
            snapshot_id: "s".to_string(),
            file_path: "m.py".to_string(),
            start_line: 1,
            end_line: 10,
            kind: level.chunk_kind(),
            level,
            fqn: "m.f".to_string(),
            language: "python".to_string(),
            content: "def f(): pass".to_string(),
            content_hash: "h".to_string(),
            summary: None,
            importance: 0.0,
            is_deleted: false,
            attrs: Map::new(),
        }
    }

    #[test]
    fn test_level_to_kind() {
        assert_eq!(ChunkLevel::Function.chunk_kind(), ChunkKind::Leaf);
        assert_eq!(ChunkLevel::Class.chunk_kind(), ChunkKind::Parent);
        assert_eq!(ChunkLevel::Repo.chunk_kind(), ChunkKind::Parent);
    }

    #[test]
    fn test_children_roundtrip() {
        let mut c = chunk(ChunkLevel::Class);
        c.add_child("chunk:r:function:m.C.a");
        c.add_child("chunk:r:function:m.C.b");
        c.add_child("chunk:r:function:m.C.a"); // duplicate
        assert_eq!(c.children().len(), 2);
    }

    #[test]
    fn test_line_count() {
        let c = chunk(ChunkLevel::Function);
        assert_eq!(c.line_count(), 10);
    }

    #[test]
    fn test_dependency_id() {
        let dep = ChunkDependency::new("a", "b", "CALLS", 1.0);
        assert_eq!(dep.id, "dep:CALLS:a:b");
    }
}
