//! codeatlas-storage: commit-keyed persistent snapshot store
//!
//! ## Core principles
//!
//! 1. Only committed state is durable: `snapshot_id = commit_hash`
//! 2. Snapshots are immutable after creation; `replace_file` is the only
//!    transition, and it produces a new snapshot
//! 3. Chunks are soft-deleted within a snapshot so diff queries can report
//!    deletions; a retention sweep (out of scope here) removes them later
//!
//! ## Usage
//!
//! ```rust,ignore
//! use codeatlas_storage::{Snapshot, SnapshotStore, SqliteSnapshotStore};
//!
//! let store = SqliteSnapshotStore::open("snapshots.db")?;
//! store.save_snapshot(&Snapshot::new("abc123", "my-repo")).await?;
//! store.save_chunks("abc123", &chunks).await?;
//!
//! // One-file transition to a new commit
//! store.replace_file("my-repo", "abc123", "def456", "src/auth.py", new_chunks).await?;
//! let diff = store.compare_snapshots("abc123", "def456").await?;
//! ```

pub mod domain;
pub mod error;
pub mod infrastructure;

pub use domain::{
    diff_chunk_sets, ChunkChange, ChunkRecord, Dependency, FileMetadata, Repository, Snapshot,
    SnapshotDiff, SnapshotStore,
};
pub use error::{ErrorKind, Result, StorageError};
pub use infrastructure::MemorySnapshotStore;
#[cfg(feature = "sqlite")]
pub use infrastructure::SqliteSnapshotStore;
