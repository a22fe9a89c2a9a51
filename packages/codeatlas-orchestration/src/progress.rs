//! Job progress for resumable runs
//!
//! A cancelled run persists the set of completed file paths; a later run
//! passes the record back to Discovery so only unfinished files are
//! re-enqueued.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgress {
    pub job_id: Uuid,
    pub repo_id: String,
    pub snapshot_id: String,
    /// Files whose per-file pipeline completed (sorted for determinism)
    pub completed_files: BTreeSet<String>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobProgress {
    pub fn new(repo_id: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: Uuid::new_v4(),
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
            completed_files: BTreeSet::new(),
            started_at: now,
            updated_at: now,
        }
    }

    pub fn mark_completed(&mut self, file_path: impl Into<String>) {
        self.completed_files.insert(file_path.into());
        self.updated_at = Utc::now();
    }

    pub fn is_completed(&self, file_path: &str) -> bool {
        self.completed_files.contains(file_path)
    }

    pub fn completed_count(&self) -> usize {
        self.completed_files.len()
    }
}
