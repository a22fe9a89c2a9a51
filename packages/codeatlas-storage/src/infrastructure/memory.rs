//! In-memory `SnapshotStore` for tests and single-run pipelines
//!
//! Mirrors the SQLite adapter's semantics. `replace_file` realizes the
//! shallow-copy contract literally: carried-over chunks are shared `Arc`s,
//! only the replaced file's entries are new allocations.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use crate::domain::{
    ChunkRecord, Dependency, FileMetadata, Repository, Snapshot, SnapshotStore,
};
use crate::{Result, StorageError};

#[derive(Default)]
struct Inner {
    repositories: HashMap<String, Repository>,
    snapshots: HashMap<String, Snapshot>,
    /// snapshot → chunk_id → chunk (Arc-shared across snapshots)
    chunks: HashMap<String, HashMap<String, Arc<ChunkRecord>>>,
    /// snapshot → dependencies
    dependencies: HashMap<String, Vec<Dependency>>,
    /// snapshot → file_path → content_hash
    file_metadata: HashMap<String, HashMap<String, String>>,
}

/// In-memory snapshot store
#[derive(Default)]
pub struct MemorySnapshotStore {
    inner: Mutex<Inner>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save_repository(&self, repository: &Repository) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner
            .repositories
            .insert(repository.repo_id.clone(), repository.clone());
        Ok(())
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.snapshots.contains_key(&snapshot.snapshot_id) {
            return Err(StorageError::snapshot_exists(&snapshot.snapshot_id));
        }
        inner
            .snapshots
            .insert(snapshot.snapshot_id.clone(), snapshot.clone());
        inner
            .chunks
            .entry(snapshot.snapshot_id.clone())
            .or_default();
        Ok(())
    }

    async fn get_snapshot(&self, snapshot_id: &str) -> Result<Snapshot> {
        let inner = self.inner.lock().await;
        inner
            .snapshots
            .get(snapshot_id)
            .cloned()
            .ok_or_else(|| StorageError::snapshot_not_found(snapshot_id))
    }

    async fn list_snapshots(&self, repo_id: &str, limit: Option<usize>) -> Result<Vec<Snapshot>> {
        let inner = self.inner.lock().await;
        let mut snapshots: Vec<Snapshot> = inner
            .snapshots
            .values()
            .filter(|s| s.repo_id == repo_id)
            .cloned()
            .collect();
        snapshots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        if let Some(limit) = limit {
            snapshots.truncate(limit);
        }
        Ok(snapshots)
    }

    async fn save_chunks(&self, snapshot_id: &str, chunks: &[ChunkRecord]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let entry = inner.chunks.entry(snapshot_id.to_string()).or_default();
        for chunk in chunks {
            entry.insert(chunk.chunk_id.clone(), Arc::new(chunk.clone()));
        }
        Ok(())
    }

    async fn get_chunks(
        &self,
        snapshot_id: &str,
        file_path: &str,
        include_deleted: bool,
    ) -> Result<Vec<ChunkRecord>> {
        let inner = self.inner.lock().await;
        let mut chunks: Vec<ChunkRecord> = inner
            .chunks
            .get(snapshot_id)
            .map(|m| {
                m.values()
                    .filter(|c| c.file_path == file_path && (include_deleted || !c.is_deleted))
                    .map(|c| c.as_ref().clone())
                    .collect()
            })
            .unwrap_or_default();
        chunks.sort_by(|a, b| {
            a.start_line
                .cmp(&b.start_line)
                .then(a.chunk_id.cmp(&b.chunk_id))
        });
        Ok(chunks)
    }

    async fn get_all_chunks(
        &self,
        snapshot_id: &str,
        include_deleted: bool,
    ) -> Result<Vec<ChunkRecord>> {
        let inner = self.inner.lock().await;
        let mut chunks: Vec<ChunkRecord> = inner
            .chunks
            .get(snapshot_id)
            .map(|m| {
                m.values()
                    .filter(|c| include_deleted || !c.is_deleted)
                    .map(|c| c.as_ref().clone())
                    .collect()
            })
            .unwrap_or_default();
        chunks.sort_by(|a, b| {
            a.file_path
                .cmp(&b.file_path)
                .then(a.start_line.cmp(&b.start_line))
                .then(a.chunk_id.cmp(&b.chunk_id))
        });
        Ok(chunks)
    }

    async fn get_chunk(&self, snapshot_id: &str, chunk_id: &str) -> Result<ChunkRecord> {
        let inner = self.inner.lock().await;
        inner
            .chunks
            .get(snapshot_id)
            .and_then(|m| m.get(chunk_id))
            .map(|c| c.as_ref().clone())
            .ok_or_else(|| StorageError::chunk_not_found(chunk_id))
    }

    async fn save_dependencies(
        &self,
        snapshot_id: &str,
        dependencies: &[Dependency],
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let entry = inner
            .dependencies
            .entry(snapshot_id.to_string())
            .or_default();
        for dep in dependencies {
            if !entry.iter().any(|d| d.id == dep.id) {
                entry.push(dep.clone());
            }
        }
        Ok(())
    }

    async fn get_dependencies(&self, snapshot_id: &str, chunk_id: &str) -> Result<Vec<Dependency>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .dependencies
            .get(snapshot_id)
            .map(|deps| {
                deps.iter()
                    .filter(|d| d.from_chunk_id == chunk_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_all_dependencies(&self, snapshot_id: &str) -> Result<Vec<Dependency>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .dependencies
            .get(snapshot_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_file_metadata(&self, entries: &[FileMetadata]) -> Result<()> {
        let mut inner = self.inner.lock().await;
        for entry in entries {
            inner
                .file_metadata
                .entry(entry.snapshot_id.clone())
                .or_default()
                .insert(entry.file_path.clone(), entry.content_hash.clone());
        }
        Ok(())
    }

    async fn get_file_metadata(&self, snapshot_id: &str) -> Result<HashMap<String, String>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .file_metadata
            .get(snapshot_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_file(
        &self,
        repo_id: &str,
        old_commit: &str,
        new_commit: &str,
        file_path: &str,
        new_chunks: Vec<ChunkRecord>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();

        if !inner.snapshots.contains_key(new_commit) {
            if !inner.snapshots.contains_key(old_commit) {
                return Err(StorageError::snapshot_not_found(old_commit));
            }
            inner.snapshots.insert(
                new_commit.to_string(),
                Snapshot {
                    snapshot_id: new_commit.to_string(),
                    repo_id: repo_id.to_string(),
                    branch_name: None,
                    created_at: now,
                    metadata: serde_json::Value::Null,
                },
            );
            // Shallow copy: carried-over chunks share their Arc
            let carried = inner.chunks.get(old_commit).cloned().unwrap_or_default();
            inner.chunks.insert(new_commit.to_string(), carried);
            let carried_meta: HashMap<String, String> = inner
                .file_metadata
                .get(old_commit)
                .map(|m| {
                    m.iter()
                        .filter(|(path, _)| path.as_str() != file_path)
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect()
                })
                .unwrap_or_default();
            inner
                .file_metadata
                .insert(new_commit.to_string(), carried_meta);
        }

        let entry = inner.chunks.entry(new_commit.to_string()).or_default();
        // Tombstone the carried copies of the replaced file
        let tombstone_ids: Vec<String> = entry
            .values()
            .filter(|c| c.file_path == file_path && !c.is_deleted)
            .map(|c| c.chunk_id.clone())
            .collect();
        for chunk_id in tombstone_ids {
            if let Some(existing) = entry.get(&chunk_id) {
                let mut tombstone = existing.as_ref().clone();
                tombstone.is_deleted = true;
                tombstone.updated_at = now;
                entry.insert(chunk_id, Arc::new(tombstone));
            }
        }
        for mut chunk in new_chunks {
            chunk.snapshot_id = new_commit.to_string();
            chunk.is_deleted = false;
            chunk.updated_at = now;
            entry.insert(chunk.chunk_id.clone(), Arc::new(chunk));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn record(snapshot: &str, file: &str, fqn: &str, hash: &str) -> ChunkRecord {
        let now = Utc::now();
        ChunkRecord {
            chunk_id: format!("chunk:r:function:{}", fqn),
            repo_id: "r".to_string(),
            snapshot_id: snapshot.to_string(),
            file_path: file.to_string(),
            start_line: 1,
            end_line: 5,
            kind: "leaf".to_string(),
            fqn: fqn.to_string(),
            language: "python".to_string(),
            content: String::new(),
            content_hash: hash.to_string(),
            summary: None,
            importance: 0.0,
            is_deleted: false,
            attrs: serde_json::Value::Null,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_same_semantics_as_sqlite_for_replace_file() {
        let store = MemorySnapshotStore::new();
        store.save_snapshot(&Snapshot::new("s1", "r")).await.unwrap();
        store
            .save_chunks(
                "s1",
                &[record("s1", "a.py", "a.f", "h1"), record("s1", "b.py", "b.g", "h2")],
            )
            .await
            .unwrap();

        store
            .replace_file("r", "s1", "s2", "a.py", vec![record("s2", "a.py", "a.f2", "h9")])
            .await
            .unwrap();

        let b = store.get_chunks("s2", "b.py", false).await.unwrap();
        assert_eq!(b.len(), 1);
        let a = store.get_chunks("s2", "a.py", false).await.unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].fqn, "a.f2");
        // Old snapshot untouched
        let old = store.get_chunks("s1", "a.py", false).await.unwrap();
        assert_eq!(old[0].fqn, "a.f");
    }

    #[tokio::test]
    async fn test_immutability() {
        let store = MemorySnapshotStore::new();
        store.save_snapshot(&Snapshot::new("s1", "r")).await.unwrap();
        assert_eq!(
            store
                .save_snapshot(&Snapshot::new("s1", "r"))
                .await
                .unwrap_err()
                .kind,
            ErrorKind::SnapshotExists
        );
    }

    #[tokio::test]
    async fn test_diff_via_default_impl() {
        let store = MemorySnapshotStore::new();
        store.save_snapshot(&Snapshot::new("s1", "r")).await.unwrap();
        store
            .save_chunks("s1", &[record("s1", "a.py", "a.f", "h1")])
            .await
            .unwrap();
        store
            .replace_file(
                "r",
                "s1",
                "s2",
                "a.py",
                vec![record("s2", "a.py", "a.f", "h2"), record("s2", "a.py", "a.g", "h3")],
            )
            .await
            .unwrap();

        let diff = store.compare_snapshots("s1", "s2").await.unwrap();
        assert_eq!(diff.modified.len(), 1);
        assert_eq!(diff.added.len(), 1);
        assert!(diff.deleted.is_empty());
    }
}
