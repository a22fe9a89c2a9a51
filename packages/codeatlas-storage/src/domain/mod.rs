//! Snapshot store domain: models and the `SnapshotStore` port
//!
//! # Core principles
//!
//! 1. Snapshots are commit-keyed and immutable: `snapshot_id = commit_hash`
//! 2. The only way to "change" a snapshot is `replace_file`, producing a
//!    new snapshot that differs in one file's chunk set
//! 3. Chunks are soft-deleted within a snapshot (`is_deleted`) so diffs can
//!    report deletions; normal listing filters them out

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;

// ═══════════════════════════════════════════════════════════════════════════
// Domain models
// ═══════════════════════════════════════════════════════════════════════════

/// Repository metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub repo_id: String,
    pub name: String,
    pub remote_url: Option<String>,
    pub default_branch: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Repository {
    pub fn new(repo_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            repo_id: repo_id.into(),
            name: name.into(),
            remote_url: None,
            default_branch: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Immutable commit-keyed snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Commit hash
    pub snapshot_id: String,
    pub repo_id: String,
    pub branch_name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Snapshot {
    pub fn new(snapshot_id: impl Into<String>, repo_id: impl Into<String>) -> Self {
        Self {
            snapshot_id: snapshot_id.into(),
            repo_id: repo_id.into(),
            branch_name: None,
            created_at: Utc::now(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Persisted chunk row (schema-aligned; built from the indexing core's chunks)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub chunk_id: String,
    pub repo_id: String,
    pub snapshot_id: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    /// "leaf" | "parent"
    pub kind: String,
    pub fqn: String,
    pub language: String,
    pub content: String,
    pub content_hash: String,
    pub summary: Option<String>,
    pub importance: f64,
    pub is_deleted: bool,
    #[serde(default)]
    pub attrs: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChunkRecord {
    /// Signature hash recorded by the chunk builder, when present
    pub fn signature_hash(&self) -> Option<&str> {
        self.attrs.get("signature_hash").and_then(|v| v.as_str())
    }
}

/// Chunk-level dependency row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: String,
    pub from_chunk_id: String,
    pub to_chunk_id: String,
    pub relationship: String,
    pub confidence: f64,
}

/// Per-file content hash for incremental change detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub repo_id: String,
    pub snapshot_id: String,
    pub file_path: String,
    pub content_hash: String,
}

// ═══════════════════════════════════════════════════════════════════════════
// Snapshot diff
// ═══════════════════════════════════════════════════════════════════════════

/// A modified chunk in a snapshot comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkChange {
    pub file_path: String,
    pub fqn: String,
    pub old_chunk_id: String,
    pub new_chunk_id: String,
    /// Signature hash differs (parameter/return/visibility change)
    pub interface_changed: bool,
}

/// Result of `compare_snapshots`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDiff {
    pub added: Vec<String>,
    pub modified: Vec<ChunkChange>,
    pub deleted: Vec<String>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// Compare two chunk sets by (file_path, fqn).
///
/// Soft-deleted chunks count as absent on the side they are deleted in, so
/// a `replace_file` tombstone surfaces as a deletion.
pub fn diff_chunk_sets(old: &[ChunkRecord], new: &[ChunkRecord]) -> SnapshotDiff {
    use std::collections::HashMap;

    let key = |c: &ChunkRecord| (c.file_path.clone(), c.fqn.clone());
    let old_map: HashMap<_, &ChunkRecord> = old
        .iter()
        .filter(|c| !c.is_deleted)
        .map(|c| (key(c), c))
        .collect();
    let new_map: HashMap<_, &ChunkRecord> = new
        .iter()
        .filter(|c| !c.is_deleted)
        .map(|c| (key(c), c))
        .collect();

    let mut diff = SnapshotDiff::default();
    for (k, new_chunk) in &new_map {
        match old_map.get(k) {
            None => diff.added.push(new_chunk.chunk_id.clone()),
            Some(old_chunk) if old_chunk.content_hash != new_chunk.content_hash => {
                diff.modified.push(ChunkChange {
                    file_path: new_chunk.file_path.clone(),
                    fqn: new_chunk.fqn.clone(),
                    old_chunk_id: old_chunk.chunk_id.clone(),
                    new_chunk_id: new_chunk.chunk_id.clone(),
                    interface_changed: old_chunk.signature_hash() != new_chunk.signature_hash(),
                });
            }
            Some(_) => {}
        }
    }
    for (k, old_chunk) in &old_map {
        if !new_map.contains_key(k) {
            diff.deleted.push(old_chunk.chunk_id.clone());
        }
    }
    diff.added.sort();
    diff.deleted.sort();
    diff.modified.sort_by(|a, b| a.fqn.cmp(&b.fqn));
    diff
}

// ═══════════════════════════════════════════════════════════════════════════
// Port trait
// ═══════════════════════════════════════════════════════════════════════════

/// Commit-keyed snapshot storage port
///
/// All writes are transactional; concurrent `save_snapshot` on the same id
/// is rejected and concurrent `replace_file` producing the same new commit
/// is serialized by the implementation.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    // ── repositories ────────────────────────────────────────────────────

    async fn save_repository(&self, repository: &Repository) -> Result<()>;

    // ── snapshots ───────────────────────────────────────────────────────

    /// Create a new immutable snapshot. Rejects an existing id with
    /// `SnapshotExists`.
    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()>;

    /// `SnapshotNotFound` for missing ids.
    async fn get_snapshot(&self, snapshot_id: &str) -> Result<Snapshot>;

    /// Newest first.
    async fn list_snapshots(&self, repo_id: &str, limit: Option<usize>) -> Result<Vec<Snapshot>>;

    // ── chunks ──────────────────────────────────────────────────────────

    async fn save_chunks(&self, snapshot_id: &str, chunks: &[ChunkRecord]) -> Result<()>;

    /// Live chunks of a file, ordered by start_line. Soft-deleted chunks
    /// are filtered unless `include_deleted`.
    async fn get_chunks(
        &self,
        snapshot_id: &str,
        file_path: &str,
        include_deleted: bool,
    ) -> Result<Vec<ChunkRecord>>;

    /// All chunks of a snapshot (diff queries pass include_deleted=true).
    async fn get_all_chunks(
        &self,
        snapshot_id: &str,
        include_deleted: bool,
    ) -> Result<Vec<ChunkRecord>>;

    async fn get_chunk(&self, snapshot_id: &str, chunk_id: &str) -> Result<ChunkRecord>;

    // ── dependencies ────────────────────────────────────────────────────

    async fn save_dependencies(
        &self,
        snapshot_id: &str,
        dependencies: &[Dependency],
    ) -> Result<()>;

    /// Dependencies where `from_chunk_id == chunk_id`.
    async fn get_dependencies(&self, snapshot_id: &str, chunk_id: &str) -> Result<Vec<Dependency>>;

    /// Every dependency of a snapshot (incremental closure computation).
    async fn get_all_dependencies(&self, snapshot_id: &str) -> Result<Vec<Dependency>>;

    // ── file metadata (incremental detection) ───────────────────────────

    async fn save_file_metadata(&self, entries: &[FileMetadata]) -> Result<()>;

    /// `file_path → content_hash` map of a snapshot.
    async fn get_file_metadata(
        &self,
        snapshot_id: &str,
    ) -> Result<std::collections::HashMap<String, String>>;

    // ── the core contract ───────────────────────────────────────────────

    /// Atomic file-granular transition `old_commit → new_commit`:
    ///
    /// 1. Create `new_commit` if missing, carrying over every other file's
    ///    chunks from `old_commit`
    /// 2. Soft-delete the carried chunks of `file_path`
    /// 3. Upsert `new_chunks` under `new_commit`
    ///
    /// Either the new snapshot exists with the updated file or no change
    /// is visible.
    async fn replace_file(
        &self,
        repo_id: &str,
        old_commit: &str,
        new_commit: &str,
        file_path: &str,
        new_chunks: Vec<ChunkRecord>,
    ) -> Result<()>;

    // ── diff ────────────────────────────────────────────────────────────

    /// Compare two snapshots; modification is content-hash inequality at
    /// the same (file_path, fqn), interface change via signature hash.
    async fn compare_snapshots(&self, old: &str, new: &str) -> Result<SnapshotDiff> {
        let old_chunks = self.get_all_chunks(old, true).await?;
        let new_chunks = self.get_all_chunks(new, true).await?;
        Ok(diff_chunk_sets(&old_chunks, &new_chunks))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(file: &str, fqn: &str, content_hash: &str, sig: Option<&str>) -> ChunkRecord {
        let now = Utc::now();
        let attrs = match sig {
            Some(sig) => serde_json::json!({ "signature_hash": sig }),
            None => serde_json::Value::Null,
        };
        ChunkRecord {
            chunk_id: format!("chunk:r:function:{}:{}", fqn, content_hash),
            repo_id: "r".to_string(),
            snapshot_id: "s".to_string(),
            file_path: file.to_string(),
            start_line: 1,
            end_line: 5,
            kind: "leaf".to_string(),
            fqn: fqn.to_string(),
            language: "python".to_string(),
            content: String::new(),
            content_hash: content_hash.to_string(),
            summary: None,
            importance: 0.0,
            is_deleted: false,
            attrs,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_diff_added() {
        let old = vec![record("a.py", "a.f", "h1", None)];
        let new = vec![
            record("a.py", "a.f", "h1", None),
            record("a.py", "a.g", "h2", None),
        ];
        let diff = diff_chunk_sets(&old, &new);
        assert_eq!(diff.added.len(), 1);
        assert!(diff.modified.is_empty());
        assert!(diff.deleted.is_empty());
    }

    #[test]
    fn test_diff_body_change_not_interface() {
        let old = vec![record("a.py", "a.f", "h1", Some("sig1"))];
        let new = vec![record("a.py", "a.f", "h2", Some("sig1"))];
        let diff = diff_chunk_sets(&old, &new);
        assert_eq!(diff.modified.len(), 1);
        assert!(!diff.modified[0].interface_changed);
    }

    #[test]
    fn test_diff_interface_change() {
        let old = vec![record("a.py", "a.f", "h1", Some("sig1"))];
        let new = vec![record("a.py", "a.f", "h2", Some("sig2"))];
        let diff = diff_chunk_sets(&old, &new);
        assert_eq!(diff.modified.len(), 1);
        assert!(diff.modified[0].interface_changed);
    }

    #[test]
    fn test_diff_soft_deleted_counts_as_deleted() {
        let old = vec![record("a.py", "a.f", "h1", None)];
        let mut tombstone = record("a.py", "a.f", "h1", None);
        tombstone.is_deleted = true;
        let new = vec![tombstone];
        let diff = diff_chunk_sets(&old, &new);
        assert_eq!(diff.deleted.len(), 1);
    }

    #[test]
    fn test_diff_unchanged_is_empty() {
        let old = vec![record("a.py", "a.f", "h1", Some("sig"))];
        let new = vec![record("a.py", "a.f", "h1", Some("sig"))];
        assert!(diff_chunk_sets(&old, &new).is_empty());
    }
}
