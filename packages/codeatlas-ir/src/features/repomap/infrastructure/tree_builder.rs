//! RepoMap tree construction
//!
//! Builds the repo → module → file → class → function tree from the chunk
//! set, with template summaries and importance copied from chunks.

use std::collections::HashMap;

use crate::features::chunking::domain::{Chunk, ChunkLevel};

use super::super::domain::{RepoMap, RepoMapLevel, RepoMapNode};

pub struct RepoMapBuilder {
    repo_id: String,
    snapshot_id: String,
}

impl RepoMapBuilder {
    pub fn new(repo_id: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
        }
    }

    pub fn build(&self, chunks: &[Chunk]) -> RepoMap {
        let mut nodes: HashMap<String, RepoMapNode> = HashMap::new();

        let root_id = format!("map:{}:repo:{}", self.repo_id, self.repo_id);
        nodes.insert(
            root_id.clone(),
            RepoMapNode {
                id: root_id.clone(),
                level: RepoMapLevel::Repo,
                name: self.repo_id.clone(),
                parent_id: None,
                children_ids: Vec::new(),
                summary: String::new(),
                importance: 1.0,
                chunk_id: chunks
                    .iter()
                    .find(|c| c.level == ChunkLevel::Repo)
                    .map(|c| c.chunk_id.clone()),
                node_id: None,
                file_path: None,
            },
        );

        // Modules (directories) → files
        let file_chunks: Vec<&Chunk> = chunks.iter().filter(|c| c.level == ChunkLevel::File).collect();
        for chunk in &file_chunks {
            let module_path = parent_dir(&chunk.file_path);
            let module_id = self.ensure_module(&mut nodes, &root_id, &module_path);

            let file_id = format!("map:{}:file:{}", self.repo_id, chunk.file_path);
            let symbol_count = chunks
                .iter()
                .filter(|c| c.file_path == chunk.file_path && c.level != ChunkLevel::File)
                .count();
            nodes.insert(
                file_id.clone(),
                RepoMapNode {
                    id: file_id.clone(),
                    level: RepoMapLevel::File,
                    name: file_name(&chunk.file_path).to_string(),
                    parent_id: Some(module_id.clone()),
                    children_ids: Vec::new(),
                    summary: format!(
                        "file {} defines {} symbols",
                        chunk.file_path, symbol_count
                    ),
                    importance: chunk.importance,
                    chunk_id: Some(chunk.chunk_id.clone()),
                    node_id: chunk
                        .attrs
                        .get("node_id")
                        .and_then(|v| v.as_str())
                        .map(String::from),
                    file_path: Some(chunk.file_path.clone()),
                },
            );
            if let Some(module) = nodes.get_mut(&module_id) {
                module.children_ids.push(file_id);
            }
        }

        // Classes first so nested functions can find their class parent
        for chunk in chunks.iter().filter(|c| c.level == ChunkLevel::Class) {
            self.insert_symbol(&mut nodes, chunk, RepoMapLevel::Class, None);
        }
        for chunk in chunks.iter().filter(|c| c.level == ChunkLevel::Function) {
            self.insert_symbol(&mut nodes, chunk, RepoMapLevel::Function, chunk_class_prefix(chunk));
        }

        // Root summary
        let file_count = file_chunks.len();
        if let Some(root) = nodes.get_mut(&root_id) {
            root.summary = format!("repository {} with {} files", self.repo_id, file_count);
            root.children_ids.sort();
        }
        for node in nodes.values_mut() {
            node.children_ids.sort();
            node.children_ids.dedup();
        }

        RepoMap {
            repo_id: self.repo_id.clone(),
            snapshot_id: self.snapshot_id.clone(),
            root_id,
            nodes,
        }
    }

    /// Class/function node under its class parent (when one exists) or file
    fn insert_symbol(
        &self,
        nodes: &mut HashMap<String, RepoMapNode>,
        chunk: &Chunk,
        level: RepoMapLevel,
        class_prefix: Option<String>,
    ) {
        let file_id = format!("map:{}:file:{}", self.repo_id, chunk.file_path);
        let parent_id = class_prefix
            .map(|class_fqn| format!("map:{}:class:{}", self.repo_id, class_fqn))
            .filter(|id| nodes.contains_key(id))
            .unwrap_or(file_id);
        if !nodes.contains_key(&parent_id) {
            return;
        }

        let tag = match level {
            RepoMapLevel::Class => "class",
            _ => "function",
        };
        let id = format!("map:{}:{}:{}", self.repo_id, tag, chunk.fqn);
        let summary = chunk
            .summary
            .clone()
            .unwrap_or_else(|| template_summary(chunk));
        nodes.insert(
            id.clone(),
            RepoMapNode {
                id: id.clone(),
                level,
                name: chunk.fqn.rsplit('.').next().unwrap_or(&chunk.fqn).to_string(),
                parent_id: Some(parent_id.clone()),
                children_ids: Vec::new(),
                summary,
                importance: chunk.importance,
                chunk_id: Some(chunk.chunk_id.clone()),
                node_id: chunk
                    .attrs
                    .get("node_id")
                    .and_then(|v| v.as_str())
                    .map(String::from),
                file_path: Some(chunk.file_path.clone()),
            },
        );
        if let Some(parent) = nodes.get_mut(&parent_id) {
            parent.children_ids.push(id);
        }
    }

    /// Module node per directory, created on demand, child of the root
    fn ensure_module(
        &self,
        nodes: &mut HashMap<String, RepoMapNode>,
        root_id: &str,
        module_path: &str,
    ) -> String {
        let id = format!("map:{}:module:{}", self.repo_id, module_path);
        if !nodes.contains_key(&id) {
            nodes.insert(
                id.clone(),
                RepoMapNode {
                    id: id.clone(),
                    level: RepoMapLevel::Module,
                    name: if module_path.is_empty() {
                        ".".to_string()
                    } else {
                        module_path.to_string()
                    },
                    parent_id: Some(root_id.to_string()),
                    children_ids: Vec::new(),
                    summary: format!("module {}", module_path),
                    importance: 0.0,
                    chunk_id: None,
                    node_id: None,
                    file_path: None,
                },
            );
            if let Some(root) = nodes.get_mut(root_id) {
                root.children_ids.push(id.clone());
            }
        }
        id
    }
}

fn parent_dir(file_path: &str) -> String {
    file_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("").to_string()
}

fn file_name(file_path: &str) -> &str {
    file_path.rsplit('/').next().unwrap_or(file_path)
}

/// FQN prefix naming the enclosing class chunk, when nested
fn chunk_class_prefix(chunk: &Chunk) -> Option<String> {
    chunk.fqn.rsplit_once('.').map(|(prefix, _)| prefix.to_string())
}

/// "function m.C.add (3 lines)"
fn template_summary(chunk: &Chunk) -> String {
    format!(
        "{} {} ({} lines)",
        chunk.level.as_str(),
        chunk.fqn,
        chunk.line_count()
    )
}
