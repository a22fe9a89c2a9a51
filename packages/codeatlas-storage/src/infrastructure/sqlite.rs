//! SQLite adapter for `SnapshotStore`
//!
//! Single-connection store guarded by a mutex: every write runs in a
//! transaction on that connection, which also serializes concurrent
//! `replace_file` calls producing the same commit. Schema and indexes
//! follow the snapshot-store contract.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::domain::{
    ChunkRecord, Dependency, FileMetadata, Repository, Snapshot, SnapshotStore,
};
use crate::{Result, StorageError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS repositories (
    repo_id        TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    remote_url     TEXT,
    default_branch TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS snapshots (
    snapshot_id TEXT PRIMARY KEY,
    repo_id     TEXT NOT NULL,
    commit_hash TEXT NOT NULL,
    branch_name TEXT,
    created_at  TEXT NOT NULL,
    metadata    TEXT
);

CREATE TABLE IF NOT EXISTS chunks (
    chunk_id     TEXT NOT NULL,
    repo_id      TEXT NOT NULL,
    snapshot_id  TEXT NOT NULL,
    file_path    TEXT NOT NULL,
    start_line   INTEGER NOT NULL,
    end_line     INTEGER NOT NULL,
    kind         TEXT NOT NULL,
    fqn          TEXT,
    language     TEXT,
    content      TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    summary      TEXT,
    importance   REAL NOT NULL DEFAULT 0,
    is_deleted   INTEGER NOT NULL DEFAULT 0,
    attrs        TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (snapshot_id, chunk_id)
);

CREATE TABLE IF NOT EXISTS dependencies (
    id            TEXT NOT NULL,
    snapshot_id   TEXT NOT NULL,
    from_chunk_id TEXT NOT NULL,
    to_chunk_id   TEXT NOT NULL,
    relationship  TEXT NOT NULL,
    confidence    REAL NOT NULL DEFAULT 1.0,
    PRIMARY KEY (snapshot_id, id),
    UNIQUE (snapshot_id, from_chunk_id, to_chunk_id, relationship)
);

CREATE TABLE IF NOT EXISTS file_metadata (
    repo_id      TEXT NOT NULL,
    snapshot_id  TEXT NOT NULL,
    file_path    TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    PRIMARY KEY (snapshot_id, file_path)
);

CREATE INDEX IF NOT EXISTS idx_chunks_snapshot_live
    ON chunks(snapshot_id) WHERE is_deleted = 0;
CREATE INDEX IF NOT EXISTS idx_chunks_repo_snapshot_file
    ON chunks(repo_id, snapshot_id, file_path);
CREATE INDEX IF NOT EXISTS idx_chunks_fqn
    ON chunks(fqn) WHERE fqn IS NOT NULL;
CREATE INDEX IF NOT EXISTS idx_chunks_content_hash
    ON chunks(content_hash);
CREATE INDEX IF NOT EXISTS idx_deps_from
    ON dependencies(from_chunk_id);
CREATE INDEX IF NOT EXISTS idx_deps_to
    ON dependencies(to_chunk_id);
";

/// SQLite-backed snapshot store
pub struct SqliteSnapshotStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSnapshotStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn insert_chunk_tx(tx: &rusqlite::Transaction<'_>, chunk: &ChunkRecord) -> Result<()> {
        tx.execute(
            "INSERT OR REPLACE INTO chunks
             (chunk_id, repo_id, snapshot_id, file_path, start_line, end_line, kind, fqn,
              language, content, content_hash, summary, importance, is_deleted, attrs,
              created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                chunk.chunk_id,
                chunk.repo_id,
                chunk.snapshot_id,
                chunk.file_path,
                chunk.start_line,
                chunk.end_line,
                chunk.kind,
                chunk.fqn,
                chunk.language,
                chunk.content,
                chunk.content_hash,
                chunk.summary,
                chunk.importance,
                chunk.is_deleted,
                serde_json::to_string(&chunk.attrs)?,
                chunk.created_at,
                chunk.updated_at,
            ],
        )?;
        Ok(())
    }
}

fn row_to_chunk(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChunkRecord> {
    let attrs: Option<String> = row.get("attrs")?;
    Ok(ChunkRecord {
        chunk_id: row.get("chunk_id")?,
        repo_id: row.get("repo_id")?,
        snapshot_id: row.get("snapshot_id")?,
        file_path: row.get("file_path")?,
        start_line: row.get("start_line")?,
        end_line: row.get("end_line")?,
        kind: row.get("kind")?,
        fqn: row.get::<_, Option<String>>("fqn")?.unwrap_or_default(),
        language: row
            .get::<_, Option<String>>("language")?
            .unwrap_or_default(),
        content: row.get("content")?,
        content_hash: row.get("content_hash")?,
        summary: row.get("summary")?,
        importance: row.get("importance")?,
        is_deleted: row.get("is_deleted")?,
        attrs: attrs
            .and_then(|a| serde_json::from_str(&a).ok())
            .unwrap_or(serde_json::Value::Null),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn row_to_snapshot(row: &rusqlite::Row<'_>) -> rusqlite::Result<Snapshot> {
    let metadata: Option<String> = row.get("metadata")?;
    Ok(Snapshot {
        snapshot_id: row.get("snapshot_id")?,
        repo_id: row.get("repo_id")?,
        branch_name: row.get("branch_name")?,
        created_at: row.get("created_at")?,
        metadata: metadata
            .and_then(|m| serde_json::from_str(&m).ok())
            .unwrap_or(serde_json::Value::Null),
    })
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn save_repository(&self, repository: &Repository) -> Result<()> {
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT INTO repositories (repo_id, name, remote_url, default_branch, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(repo_id) DO UPDATE SET
                 name = excluded.name,
                 remote_url = excluded.remote_url,
                 default_branch = excluded.default_branch,
                 updated_at = excluded.updated_at",
            params![
                repository.repo_id,
                repository.name,
                repository.remote_url,
                repository.default_branch,
                repository.created_at,
                repository.updated_at,
            ],
        )?;
        Ok(())
    }

    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let conn = self.conn.lock()?;
        let existing: Option<String> = conn
            .query_row(
                "SELECT snapshot_id FROM snapshots WHERE snapshot_id = ?1",
                params![snapshot.snapshot_id],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            return Err(StorageError::snapshot_exists(&snapshot.snapshot_id));
        }
        conn.execute(
            "INSERT INTO snapshots (snapshot_id, repo_id, commit_hash, branch_name, created_at, metadata)
             VALUES (?1, ?2, ?1, ?3, ?4, ?5)",
            params![
                snapshot.snapshot_id,
                snapshot.repo_id,
                snapshot.branch_name,
                snapshot.created_at,
                serde_json::to_string(&snapshot.metadata)?,
            ],
        )?;
        Ok(())
    }

    async fn get_snapshot(&self, snapshot_id: &str) -> Result<Snapshot> {
        let conn = self.conn.lock()?;
        conn.query_row(
            "SELECT snapshot_id, repo_id, branch_name, created_at, metadata
             FROM snapshots WHERE snapshot_id = ?1",
            params![snapshot_id],
            row_to_snapshot,
        )
        .optional()?
        .ok_or_else(|| StorageError::snapshot_not_found(snapshot_id))
    }

    async fn list_snapshots(&self, repo_id: &str, limit: Option<usize>) -> Result<Vec<Snapshot>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT snapshot_id, repo_id, branch_name, created_at, metadata
             FROM snapshots WHERE repo_id = ?1
             ORDER BY created_at DESC
             LIMIT ?2",
        )?;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let snapshots = stmt
            .query_map(params![repo_id, limit], row_to_snapshot)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(snapshots)
    }

    async fn save_chunks(&self, snapshot_id: &str, chunks: &[ChunkRecord]) -> Result<()> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;
        for chunk in chunks {
            debug_assert_eq!(chunk.snapshot_id, snapshot_id);
            Self::insert_chunk_tx(&tx, chunk)?;
        }
        tx.commit()?;
        debug!(snapshot_id, count = chunks.len(), "chunks saved");
        Ok(())
    }

    async fn get_chunks(
        &self,
        snapshot_id: &str,
        file_path: &str,
        include_deleted: bool,
    ) -> Result<Vec<ChunkRecord>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM chunks
             WHERE snapshot_id = ?1 AND file_path = ?2 AND (is_deleted = 0 OR ?3)
             ORDER BY start_line, chunk_id",
        )?;
        let chunks = stmt
            .query_map(params![snapshot_id, file_path, include_deleted], row_to_chunk)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(chunks)
    }

    async fn get_all_chunks(
        &self,
        snapshot_id: &str,
        include_deleted: bool,
    ) -> Result<Vec<ChunkRecord>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM chunks
             WHERE snapshot_id = ?1 AND (is_deleted = 0 OR ?2)
             ORDER BY file_path, start_line, chunk_id",
        )?;
        let chunks = stmt
            .query_map(params![snapshot_id, include_deleted], row_to_chunk)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(chunks)
    }

    async fn get_chunk(&self, snapshot_id: &str, chunk_id: &str) -> Result<ChunkRecord> {
        let conn = self.conn.lock()?;
        conn.query_row(
            "SELECT * FROM chunks WHERE snapshot_id = ?1 AND chunk_id = ?2",
            params![snapshot_id, chunk_id],
            row_to_chunk,
        )
        .optional()?
        .ok_or_else(|| StorageError::chunk_not_found(chunk_id))
    }

    async fn save_dependencies(
        &self,
        snapshot_id: &str,
        dependencies: &[Dependency],
    ) -> Result<()> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;
        for dep in dependencies {
            tx.execute(
                "INSERT OR REPLACE INTO dependencies
                 (id, snapshot_id, from_chunk_id, to_chunk_id, relationship, confidence)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    dep.id,
                    snapshot_id,
                    dep.from_chunk_id,
                    dep.to_chunk_id,
                    dep.relationship,
                    dep.confidence,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn get_dependencies(&self, snapshot_id: &str, chunk_id: &str) -> Result<Vec<Dependency>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, from_chunk_id, to_chunk_id, relationship, confidence
             FROM dependencies WHERE snapshot_id = ?1 AND from_chunk_id = ?2",
        )?;
        let deps = stmt
            .query_map(params![snapshot_id, chunk_id], |row| {
                Ok(Dependency {
                    id: row.get(0)?,
                    from_chunk_id: row.get(1)?,
                    to_chunk_id: row.get(2)?,
                    relationship: row.get(3)?,
                    confidence: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(deps)
    }

    async fn get_all_dependencies(&self, snapshot_id: &str) -> Result<Vec<Dependency>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, from_chunk_id, to_chunk_id, relationship, confidence
             FROM dependencies WHERE snapshot_id = ?1",
        )?;
        let deps = stmt
            .query_map(params![snapshot_id], |row| {
                Ok(Dependency {
                    id: row.get(0)?,
                    from_chunk_id: row.get(1)?,
                    to_chunk_id: row.get(2)?,
                    relationship: row.get(3)?,
                    confidence: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(deps)
    }

    async fn save_file_metadata(&self, entries: &[FileMetadata]) -> Result<()> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;
        for entry in entries {
            tx.execute(
                "INSERT OR REPLACE INTO file_metadata (repo_id, snapshot_id, file_path, content_hash)
                 VALUES (?1, ?2, ?3, ?4)",
                params![entry.repo_id, entry.snapshot_id, entry.file_path, entry.content_hash],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    async fn get_file_metadata(&self, snapshot_id: &str) -> Result<HashMap<String, String>> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT file_path, content_hash FROM file_metadata WHERE snapshot_id = ?1",
        )?;
        let entries = stmt
            .query_map(params![snapshot_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok(entries)
    }

    async fn replace_file(
        &self,
        repo_id: &str,
        old_commit: &str,
        new_commit: &str,
        file_path: &str,
        new_chunks: Vec<ChunkRecord>,
    ) -> Result<()> {
        let mut conn = self.conn.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now();

        let new_exists: Option<String> = tx
            .query_row(
                "SELECT snapshot_id FROM snapshots WHERE snapshot_id = ?1",
                params![new_commit],
                |row| row.get(0),
            )
            .optional()?;

        if new_exists.is_none() {
            // Verify the base exists before forking from it
            let old_exists: Option<String> = tx
                .query_row(
                    "SELECT snapshot_id FROM snapshots WHERE snapshot_id = ?1",
                    params![old_commit],
                    |row| row.get(0),
                )
                .optional()?;
            if old_exists.is_none() {
                return Err(StorageError::snapshot_not_found(old_commit));
            }

            tx.execute(
                "INSERT INTO snapshots (snapshot_id, repo_id, commit_hash, branch_name, created_at, metadata)
                 VALUES (?1, ?2, ?1, NULL, ?3, NULL)",
                params![new_commit, repo_id, now],
            )?;
            // Carry every file's chunks forward; the target file's copies
            // are tombstoned below
            tx.execute(
                "INSERT INTO chunks
                 (chunk_id, repo_id, snapshot_id, file_path, start_line, end_line, kind, fqn,
                  language, content, content_hash, summary, importance, is_deleted, attrs,
                  created_at, updated_at)
                 SELECT chunk_id, repo_id, ?1, file_path, start_line, end_line, kind, fqn,
                        language, content, content_hash, summary, importance, is_deleted, attrs,
                        created_at, ?2
                 FROM chunks WHERE snapshot_id = ?3",
                params![new_commit, now, old_commit],
            )?;
            tx.execute(
                "INSERT INTO file_metadata (repo_id, snapshot_id, file_path, content_hash)
                 SELECT repo_id, ?1, file_path, content_hash
                 FROM file_metadata WHERE snapshot_id = ?2 AND file_path != ?3",
                params![new_commit, old_commit, file_path],
            )?;
        }

        tx.execute(
            "UPDATE chunks SET is_deleted = 1, updated_at = ?1
             WHERE snapshot_id = ?2 AND file_path = ?3",
            params![now, new_commit, file_path],
        )?;

        for mut chunk in new_chunks {
            chunk.snapshot_id = new_commit.to_string();
            chunk.is_deleted = false;
            chunk.updated_at = now;
            Self::insert_chunk_tx(&tx, &chunk)?;
        }

        tx.commit()?;
        debug!(repo_id, old_commit, new_commit, file_path, "replace_file committed");
        Ok(())
    }
}
