//! codeatlas-orchestration: pipeline execution over the indexing core
//!
//! Runs the stage DAG (Git → Discovery → Parsing → IR → SemanticIR →
//! Graph → Chunk → RepoMap → Indexing) with per-file fan-out, cooperative
//! cancellation, incremental input selection, retries with backoff, and
//! resilient external-indexer feeding.

pub mod cancellation;
pub mod dag;
pub mod discovery;
pub mod error;
pub mod incremental;
pub mod indexing;
pub mod job;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;

pub use cancellation::CancellationToken;
pub use dag::StageDag;
pub use discovery::{DiscoveredFile, Discovery, DiscoveryReport};
pub use error::{ErrorCategory, OrchestratorError, Result};
pub use incremental::ReverseImportIndex;
pub use indexing::{
    CircuitBreaker, IndexerSet, LexicalDoc, LexicalIndexer, MemoryLexicalIndex, MemorySymbolIndex,
    MemoryVectorIndex, RetryPolicy, SymbolDoc, SymbolIndexer, VectorDoc, VectorIndexer,
};
pub use job::{PipelineRun, RunState};
pub use orchestrator::{PipelineOrchestrator, PipelineReport, RunOptions};
pub use pipeline::{default_stages, FailPolicy, FileDiagnostic, PipelineMetrics, StageId, StageSpec};
pub use progress::JobProgress;
