//! Stage declarations and shared pipeline types
//!
//! Each stage declares what it depends on and how its failures propagate;
//! the DAG validates the declarations and fixes the execution order. Stage
//! executors live on the orchestrator.

use serde::{Deserialize, Serialize};

/// Stage identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageId {
    Git,
    Discovery,
    Parsing,
    Ir,
    SemanticIr,
    Graph,
    Chunk,
    RepoMap,
    Indexing,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Git => "Git",
            StageId::Discovery => "Discovery",
            StageId::Parsing => "Parsing",
            StageId::Ir => "IR",
            StageId::SemanticIr => "SemanticIR",
            StageId::Graph => "Graph",
            StageId::Chunk => "Chunk",
            StageId::RepoMap => "RepoMap",
            StageId::Indexing => "Indexing",
        }
    }

    /// Stages that fan out per file (everything else is sequential)
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            StageId::Parsing | StageId::Ir | StageId::SemanticIr | StageId::Chunk
        )
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure propagation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailPolicy {
    /// The failing file is dropped, the stage continues
    SkipFile,
    /// The whole stage is skipped, the pipeline continues
    SkipStage,
    /// The run fails
    Fatal,
}

/// Static stage declaration
#[derive(Debug, Clone)]
pub struct StageSpec {
    pub id: StageId,
    pub depends_on: &'static [StageId],
    pub fail_policy: FailPolicy,
}

/// The fixed pipeline topology:
/// Git → Discovery → Parsing → IR → SemanticIR → Graph → Chunk → RepoMap → Indexing
pub fn default_stages() -> Vec<StageSpec> {
    use StageId::*;
    vec![
        StageSpec { id: Git, depends_on: &[], fail_policy: FailPolicy::Fatal },
        StageSpec { id: Discovery, depends_on: &[Git], fail_policy: FailPolicy::Fatal },
        StageSpec { id: Parsing, depends_on: &[Discovery], fail_policy: FailPolicy::SkipFile },
        StageSpec { id: Ir, depends_on: &[Parsing], fail_policy: FailPolicy::SkipFile },
        StageSpec { id: SemanticIr, depends_on: &[Ir], fail_policy: FailPolicy::SkipFile },
        StageSpec { id: Graph, depends_on: &[SemanticIr], fail_policy: FailPolicy::Fatal },
        StageSpec { id: Chunk, depends_on: &[Graph], fail_policy: FailPolicy::SkipFile },
        StageSpec { id: RepoMap, depends_on: &[Chunk], fail_policy: FailPolicy::SkipStage },
        StageSpec { id: Indexing, depends_on: &[Chunk], fail_policy: FailPolicy::Fatal },
    ]
}

/// A file-scoped failure surfaced to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDiagnostic {
    pub file_path: String,
    pub stage: String,
    pub error_kind: String,
    pub message: String,
}

/// Per-run metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineMetrics {
    pub files_discovered: usize,
    pub files_processed: usize,
    pub files_skipped: usize,
    pub nodes_created: usize,
    pub edges_created: usize,
    pub chunks_created: usize,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topology_names() {
        let stages = default_stages();
        assert_eq!(stages.len(), 9);
        assert_eq!(stages[0].id.as_str(), "Git");
        assert_eq!(stages[8].id.as_str(), "Indexing");
    }

    #[test]
    fn test_per_file_stages() {
        assert!(StageId::Parsing.is_per_file());
        assert!(StageId::Chunk.is_per_file());
        assert!(!StageId::Graph.is_per_file());
        assert!(!StageId::Discovery.is_per_file());
    }

    #[test]
    fn test_reducer_failures_are_fatal() {
        let stages = default_stages();
        let graph = stages.iter().find(|s| s.id == StageId::Graph).unwrap();
        assert_eq!(graph.fail_policy, FailPolicy::Fatal);
        let parsing = stages.iter().find(|s| s.id == StageId::Parsing).unwrap();
        assert_eq!(parsing.fail_policy, FailPolicy::SkipFile);
    }
}
