//! Chunk construction from per-file IR
//!
//! Leaf chunks carry the exact byte span of their function; class and file
//! chunks are parents with bounded excerpts and children links. Every
//! chunk records the IR node ids whose spans it covers.

use serde_json::{Map, Value};

use crate::features::ir_generation::domain::IRDocument;
use crate::shared::models::{CodeatlasError, Node, NodeKind, Result};

use super::super::domain::{Chunk, ChunkId, ChunkIdGenerator, ChunkLevel, ChunkToIr};

/// Parent-chunk excerpts are capped at this many bytes
const PARENT_EXCERPT_BYTES: usize = 4096;

/// Chunks of one file plus the chunk→IR node mapping
#[derive(Debug, Default)]
pub struct FileChunks {
    pub chunks: Vec<Chunk>,
    pub chunk_to_ir: ChunkToIr,
}

/// Per-snapshot chunk builder (shared id generator across files)
pub struct ChunkBuilder {
    repo_id: String,
    snapshot_id: String,
    id_gen: ChunkIdGenerator,
}

impl ChunkBuilder {
    pub fn new(repo_id: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
            id_gen: ChunkIdGenerator::new(),
        }
    }

    /// Build the chunk hierarchy for one file: file → classes → functions.
    pub fn build_file(&self, doc: &IRDocument, source: &str) -> Result<FileChunks> {
        let Some(file_node) = doc.file_node() else {
            return Ok(FileChunks::default());
        };

        let mut result = FileChunks::default();

        // Leaf chunks: functions and methods
        let mut leaf_ids: Vec<(String, ChunkId)> = Vec::new(); // (parent node id, chunk id)
        for node in doc.nodes.iter().filter(|n| {
            matches!(n.kind, NodeKind::Function | NodeKind::Method) && n.fqn.is_some()
        }) {
            if !file_node.span.contains(&node.span) {
                return Err(CodeatlasError::chunk_span(format!(
                    "Function {} span escapes its file node",
                    node.fqn.as_deref().unwrap_or("?")
                ))
                .with_file(&doc.file_path));
            }
            let mut chunk = self.make_chunk(doc, node, ChunkLevel::Function, node.span.text(source));
            record_nodes(doc, &mut chunk, &mut result.chunk_to_ir);
            if let Some(parent) = &node.parent_id {
                leaf_ids.push((parent.clone(), chunk.chunk_id.clone()));
            }
            result.chunks.push(chunk);
        }

        // Class-level parents
        let mut class_ids: Vec<(String, ChunkId)> = Vec::new(); // (node id, chunk id)
        for node in doc.nodes.iter().filter(|n| n.kind.is_type_like()) {
            let excerpt = bounded_excerpt(node.span.text(source));
            let mut chunk = self.make_chunk(doc, node, ChunkLevel::Class, &excerpt);
            for (parent_node, child_chunk) in &leaf_ids {
                if parent_node == &node.id {
                    chunk.add_child(child_chunk);
                }
            }
            record_nodes(doc, &mut chunk, &mut result.chunk_to_ir);
            class_ids.push((node.id.clone(), chunk.chunk_id.clone()));
            result.chunks.push(chunk);
        }

        // File-level parent
        let excerpt = bounded_excerpt(source);
        let mut file_chunk = self.make_chunk(doc, file_node, ChunkLevel::File, &excerpt);
        for (_, chunk_id) in &class_ids {
            file_chunk.add_child(chunk_id);
        }
        for (parent_node, chunk_id) in &leaf_ids {
            if parent_node == &file_node.id {
                file_chunk.add_child(chunk_id);
            }
        }
        record_nodes(doc, &mut file_chunk, &mut result.chunk_to_ir);
        result.chunks.push(file_chunk);

        Ok(result)
    }

    /// Repository-root parent chunk over all file chunks
    pub fn build_repo_chunk(&self, file_chunks: &[&Chunk]) -> Chunk {
        let mut paths: Vec<&str> = file_chunks.iter().map(|c| c.file_path.as_str()).collect();
        paths.sort();
        let content = bounded_excerpt(&paths.join("\n"));
        let chunk_id = self.id_gen.generate(&self.repo_id, ChunkLevel::Repo, &self.repo_id, 0, 0);

        let mut attrs = Map::new();
        attrs.insert(
            "children".to_string(),
            Value::Array(
                file_chunks
                    .iter()
                    .map(|c| Value::String(c.chunk_id.clone()))
                    .collect(),
            ),
        );

        Chunk {
            chunk_id,
            repo_id: self.repo_id.clone(),
            snapshot_id: self.snapshot_id.clone(),
            file_path: String::new(),
            start_line: 0,
            end_line: 0,
            kind: ChunkLevel::Repo.chunk_kind(),
            level: ChunkLevel::Repo,
            fqn: self.repo_id.clone(),
            language: String::new(),
            content_hash: crate::shared::utils::hash::content_hash(&content),
            content,
            summary: Some(format!("repository {} with {} files", self.repo_id, file_chunks.len())),
            importance: 1.0,
            is_deleted: false,
            attrs,
        }
    }

    fn make_chunk(&self, doc: &IRDocument, node: &Node, level: ChunkLevel, content: &str) -> Chunk {
        let fqn = node
            .fqn
            .clone()
            .unwrap_or_else(|| doc.file_path.clone());
        let chunk_id = self.id_gen.generate(
            &self.repo_id,
            level,
            &fqn,
            node.span.start_line,
            node.span.end_line,
        );

        let mut attrs = Map::new();
        if let Some(docstring) = &node.docstring {
            attrs.insert("docstring".to_string(), Value::String(docstring.clone()));
        }
        if let Some(signature) = doc
            .signature_entities
            .iter()
            .find(|s| s.owner_node_id == node.id)
        {
            attrs.insert(
                "signature_hash".to_string(),
                Value::String(signature.signature_hash.clone()),
            );
            attrs.insert("signature".to_string(), Value::String(signature.raw.clone()));
        }
        attrs.insert("node_id".to_string(), Value::String(node.id.clone()));

        Chunk {
            chunk_id,
            repo_id: self.repo_id.clone(),
            snapshot_id: self.snapshot_id.clone(),
            file_path: doc.file_path.clone(),
            start_line: node.span.start_line,
            end_line: node.span.end_line,
            kind: level.chunk_kind(),
            level,
            fqn,
            language: doc.language.clone(),
            content: content.to_string(),
            content_hash: node.content_hash.clone(),
            summary: node
                .docstring
                .as_ref()
                .map(|d| d.lines().next().unwrap_or("").to_string()),
            importance: 0.0,
            is_deleted: false,
            attrs,
        }
    }

}

/// Record every IR node whose span lies inside the chunk, both in the
/// chunk's attrs and in the snapshot-wide chunk→IR mapping.
fn record_nodes(doc: &IRDocument, chunk: &mut Chunk, chunk_to_ir: &mut ChunkToIr) {
    let node_ids: Vec<String> = doc
        .nodes
        .iter()
        .filter(|n| {
            n.file_path == chunk.file_path
                && n.span.start_line >= chunk.start_line
                && n.span.end_line <= chunk.end_line
        })
        .map(|n| n.id.clone())
        .collect();
    chunk.attrs.insert(
        "node_ids".to_string(),
        Value::Array(node_ids.iter().map(|id| Value::String(id.clone())).collect()),
    );
    chunk_to_ir.insert(chunk.chunk_id.clone(), node_ids);
}

/// First `PARENT_EXCERPT_BYTES` of the text, cut at a line boundary
fn bounded_excerpt(text: &str) -> String {
    if text.len() <= PARENT_EXCERPT_BYTES {
        return text.to_string();
    }
    let mut cut = PARENT_EXCERPT_BYTES;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }
    let head = &text[..cut];
    match head.rfind('\n') {
        Some(newline) => head[..newline].to_string(),
        None => head.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir_generation::IrGenerator;
    use crate::features::parsing::infrastructure::ParserRegistry;

    fn chunks_for(file: &str, source: &str) -> FileChunks {
        let registry = ParserRegistry::with_default_plugins();
        let tree = registry.parse(file, source.as_bytes()).unwrap();
        let plugin = registry.plugin_for_path(file).unwrap();
        let doc = IrGenerator::new("repo", "snap1").generate(&tree, plugin.as_ref());
        ChunkBuilder::new("repo", "snap1")
            .build_file(&doc, &tree.source)
            .unwrap()
    }

    #[test]
    fn test_python_class_hierarchy() {
        let result = chunks_for(
            "mypkg/calc.py",
            "class Calculator:\n    def add(self, x: int, y: int) -> int:\n        return x + y\n",
        );

        // One leaf for add, one parent for Calculator, one for the file
        assert_eq!(result.chunks.len(), 3);

        let leaf = result
            .chunks
            .iter()
            .find(|c| c.level == ChunkLevel::Function)
            .unwrap();
        assert_eq!(leaf.chunk_id, "chunk:repo:function:mypkg.calc.Calculator.add");
        assert!(leaf.content.starts_with("def add"));
        assert!(leaf.attrs.contains_key("signature_hash"));

        let class = result
            .chunks
            .iter()
            .find(|c| c.level == ChunkLevel::Class)
            .unwrap();
        assert_eq!(class.children(), vec![leaf.chunk_id.clone()]);

        let file = result
            .chunks
            .iter()
            .find(|c| c.level == ChunkLevel::File)
            .unwrap();
        assert!(file.children().contains(&class.chunk_id));
    }

    #[test]
    fn test_leaf_content_is_exact_span() {
        let source = "def f():\n    return 1\n\n\ndef g():\n    return 2   \n";
        let result = chunks_for("m.py", source);
        let g = result
            .chunks
            .iter()
            .find(|c| c.fqn == "m.g")
            .unwrap();
        // Trailing whitespace inside the span is preserved
        assert!(source.contains(&g.content));
    }

    #[test]
    fn test_chunk_to_ir_mapping() {
        let result = chunks_for(
            "m.py",
            "class C:\n    def m(self):\n        pass\n",
        );
        let leaf = result
            .chunks
            .iter()
            .find(|c| c.level == ChunkLevel::Function)
            .unwrap();
        let nodes = result.chunk_to_ir.get(&leaf.chunk_id).unwrap();
        // The method node and its parameter at minimum
        assert!(nodes.len() >= 2);
        assert!(!leaf.node_ids().is_empty());
    }

    #[test]
    fn test_repo_chunk() {
        let a = chunks_for("a.py", "def f():\n    pass\n");
        let builder = ChunkBuilder::new("repo", "snap1");
        let file_chunks: Vec<&Chunk> = a
            .chunks
            .iter()
            .filter(|c| c.level == ChunkLevel::File)
            .collect();
        let repo = builder.build_repo_chunk(&file_chunks);
        assert_eq!(repo.level, ChunkLevel::Repo);
        assert_eq!(repo.children().len(), 1);
        assert!(repo.summary.unwrap().contains("1 files"));
    }

    #[test]
    fn test_overloaded_methods_get_distinct_ids() {
        // Java overloads share an FQN
        let result = chunks_for(
            "A.java",
            "class A { void f(int x) { } void f(int x, int y) { } }",
        );
        let leafs: Vec<_> = result
            .chunks
            .iter()
            .filter(|c| c.level == ChunkLevel::Function)
            .collect();
        assert_eq!(leafs.len(), 2);
        assert_ne!(leafs[0].chunk_id, leafs[1].chunk_id);
    }
}
