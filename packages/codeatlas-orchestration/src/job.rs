//! Pipeline run state machine
//!
//! States: Pending → Running → {Completed | Failed | CancelledPartial}.
//! Transitions are exclusive; the final state is recorded in the run
//! report and the snapshot metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ErrorCategory, OrchestratorError, Result};

/// Run state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Pending {
        queued_at: DateTime<Utc>,
    },
    Running {
        started_at: DateTime<Utc>,
        current_stage: String,
    },
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        duration_ms: u64,
        files_processed: usize,
    },
    Failed {
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
        error: String,
        error_category: ErrorCategory,
        failed_stage: String,
    },
    CancelledPartial {
        started_at: DateTime<Utc>,
        cancelled_at: DateTime<Utc>,
        files_processed: usize,
    },
}

impl RunState {
    pub fn name(&self) -> &'static str {
        match self {
            RunState::Pending { .. } => "pending",
            RunState::Running { .. } => "running",
            RunState::Completed { .. } => "completed",
            RunState::Failed { .. } => "failed",
            RunState::CancelledPartial { .. } => "cancelled_partial",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed { .. } | RunState::Failed { .. } | RunState::CancelledPartial { .. }
        )
    }
}

/// One pipeline run over a snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub repo_id: String,
    pub snapshot_id: String,
    pub state: RunState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PipelineRun {
    pub fn new(repo_id: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
            state: RunState::Pending { queued_at: now },
            created_at: now,
            updated_at: now,
        }
    }

    fn started_at(&self) -> Result<DateTime<Utc>> {
        match &self.state {
            RunState::Running { started_at, .. } => Ok(*started_at),
            other => Err(OrchestratorError::InvalidStateTransition {
                from: other.name().to_string(),
                to: "terminal".to_string(),
            }),
        }
    }

    /// Pending → Running
    pub fn start(&mut self, stage: impl Into<String>) -> Result<()> {
        match &self.state {
            RunState::Pending { .. } => {
                let now = Utc::now();
                self.state = RunState::Running {
                    started_at: now,
                    current_stage: stage.into(),
                };
                self.updated_at = now;
                Ok(())
            }
            other => Err(OrchestratorError::InvalidStateTransition {
                from: other.name().to_string(),
                to: "running".to_string(),
            }),
        }
    }

    /// Update the stage label of a running run
    pub fn advance_stage(&mut self, stage: impl Into<String>) -> Result<()> {
        match &mut self.state {
            RunState::Running { current_stage, .. } => {
                *current_stage = stage.into();
                self.updated_at = Utc::now();
                Ok(())
            }
            other => Err(OrchestratorError::InvalidStateTransition {
                from: other.name().to_string(),
                to: "running".to_string(),
            }),
        }
    }

    /// Running → Completed
    pub fn complete(&mut self, files_processed: usize) -> Result<()> {
        let started_at = self.started_at()?;
        let now = Utc::now();
        self.state = RunState::Completed {
            started_at,
            completed_at: now,
            duration_ms: (now - started_at).num_milliseconds().max(0) as u64,
            files_processed,
        };
        self.updated_at = now;
        Ok(())
    }

    /// Running → Failed
    pub fn fail(
        &mut self,
        stage: impl Into<String>,
        error: &OrchestratorError,
    ) -> Result<()> {
        let started_at = self.started_at()?;
        let now = Utc::now();
        self.state = RunState::Failed {
            started_at,
            failed_at: now,
            error: error.to_string(),
            error_category: error.category(),
            failed_stage: stage.into(),
        };
        self.updated_at = now;
        Ok(())
    }

    /// Running → CancelledPartial
    pub fn cancel_partial(&mut self, files_processed: usize) -> Result<()> {
        let started_at = self.started_at()?;
        let now = Utc::now();
        self.state = RunState::CancelledPartial {
            started_at,
            cancelled_at: now,
            files_processed,
        };
        self.updated_at = now;
        Ok(())
    }
}
