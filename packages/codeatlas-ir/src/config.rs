//! Configuration surface consumed by the indexing core
//!
//! Loading (CLI flags, env, files) is the caller's problem; the core only
//! consumes this struct. Every option has a working default.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Analysis depth mode
///
/// Gates the semantic IR stage and downstream summarizers:
/// - `Fast`: structural IR only, no CFG/DFG
/// - `Balanced`: CFG/DFG with per-function block limits
/// - `Deep`: unbounded semantic IR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexMode {
    Fast,
    Balanced,
    Deep,
}

impl IndexMode {
    pub fn semantic_ir_enabled(&self) -> bool {
        !matches!(self, IndexMode::Fast)
    }

    /// Max CFG blocks per function; None = unbounded
    pub fn semantic_ir_block_limit(&self) -> Option<usize> {
        match self {
            IndexMode::Fast => Some(0),
            IndexMode::Balanced => Some(512),
            IndexMode::Deep => None,
        }
    }
}

/// Per-stage time budgets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTimeouts {
    /// Whole-pipeline budget
    pub pipeline: Duration,
    /// Per-file IR build budget
    pub ir_per_file: Duration,
    /// Per-file chunk build budget
    pub chunk_per_file: Duration,
    /// Vector indexing batch budget
    pub vector_batch: Duration,
    /// Lexical indexing batch budget
    pub lexical_batch: Duration,
    /// Explicit overrides keyed by stage name
    pub overrides: HashMap<String, Duration>,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            pipeline: Duration::from_secs(600),
            ir_per_file: Duration::from_secs(30),
            chunk_per_file: Duration::from_secs(10),
            vector_batch: Duration::from_secs(60),
            lexical_batch: Duration::from_secs(30),
            overrides: HashMap::new(),
        }
    }
}

impl StageTimeouts {
    pub fn for_stage(&self, stage: &str) -> Option<Duration> {
        self.overrides.get(stage).copied()
    }
}

/// Core indexing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Per-file fan-out cap for parallel stages
    pub parallel_workers: usize,
    pub mode: IndexMode,
    /// Files larger than this are skipped with a diagnostic
    pub max_file_bytes: u64,
    /// Glob filters applied by Discovery
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    /// Additive whitelist of file extensions (empty = registry default)
    pub supported_extensions: Vec<String>,
    /// Damping factor for chunk importance, range (0, 1)
    pub pagerank_damping: f64,
    pub stage_timeouts: StageTimeouts,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            mode: IndexMode::Balanced,
            max_file_bytes: 2 * 1024 * 1024,
            include_patterns: Vec::new(),
            exclude_patterns: vec![
                "**/.git/**".to_string(),
                "**/node_modules/**".to_string(),
                "**/vendor/**".to_string(),
                "**/target/**".to_string(),
                "**/__pycache__/**".to_string(),
                "**/*.min.js".to_string(),
                "**/dist/**".to_string(),
                "**/build/**".to_string(),
            ],
            supported_extensions: Vec::new(),
            pagerank_damping: 0.85,
            stage_timeouts: StageTimeouts::default(),
        }
    }
}

impl IndexConfig {
    /// Validate option ranges; called once at pipeline start.
    pub fn validate(&self) -> Result<(), String> {
        if self.parallel_workers == 0 {
            return Err("parallel_workers must be at least 1".to_string());
        }
        if !(0.0..1.0).contains(&self.pagerank_damping) || self.pagerank_damping == 0.0 {
            return Err(format!(
                "pagerank_damping must be in (0, 1), got {}",
                self.pagerank_damping
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(IndexConfig::default().validate().is_ok());
    }

    #[test]
    fn test_damping_range_rejected() {
        let mut config = IndexConfig::default();
        config.pagerank_damping = 1.5;
        assert!(config.validate().is_err());
        config.pagerank_damping = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mode_gates_semantic_ir() {
        assert!(!IndexMode::Fast.semantic_ir_enabled());
        assert!(IndexMode::Balanced.semantic_ir_enabled());
        assert!(IndexMode::Deep.semantic_ir_enabled());
        assert_eq!(IndexMode::Deep.semantic_ir_block_limit(), None);
    }

    #[test]
    fn test_default_excludes_cover_git() {
        let config = IndexConfig::default();
        assert!(config.exclude_patterns.iter().any(|p| p.contains(".git")));
    }
}
