//! Pipeline orchestrator
//!
//! Executes the stage DAG over a repository snapshot: sequential global
//! stages, rayon fan-out for the per-file chain (Parsing → IR →
//! SemanticIR → Chunk), a single-threaded Graph reduction, and a
//! transactional Indexing stage feeding the snapshot store and the
//! external indexers.
//!
//! Cancellation is cooperative: the token is polled between files,
//! in-flight files drain, and the run ends CancelledPartial with a
//! JobProgress the next run can resume from.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use codeatlas_ir::features::chunking::domain::ChunkToIr;
use codeatlas_ir::features::chunking::infrastructure::ChunkBuilder;
use codeatlas_ir::{
    assign_importance, Chunk, ChunkDependency, GraphBuilder, GraphDocument, IRDocument,
    IndexConfig, IrGenerator, PageRankEngine, PageRankSettings, ParserRegistry, RepoMap,
    RepoMapBuilder, SemanticIrBuilder,
};
use codeatlas_ir::features::chunking::infrastructure::DependencyExtractor;
use codeatlas_storage::{
    ChunkRecord, Dependency as StorageDependency, FileMetadata, Snapshot, SnapshotStore,
    StorageError,
};

use crate::cancellation::CancellationToken;
use crate::dag::StageDag;
use crate::discovery::{DiscoveredFile, Discovery, DiscoveryReport};
use crate::error::{ErrorCategory, OrchestratorError, Result};
use crate::incremental::ReverseImportIndex;
use crate::indexing::{CircuitBreaker, IndexerSet, LexicalDoc, RetryPolicy, SymbolDoc};
use crate::job::{PipelineRun, RunState};
use crate::pipeline::{default_stages, FileDiagnostic, PipelineMetrics, StageId};
use crate::progress::JobProgress;

/// Per-run options
#[derive(Default)]
pub struct RunOptions {
    /// Previous snapshot id; enables incremental input selection and
    /// `replace_file`-based persistence
    pub previous_snapshot: Option<String>,
    /// Progress record from a cancelled run to resume from
    pub resume: Option<JobProgress>,
}

/// Final run report
pub struct PipelineReport {
    pub run: PipelineRun,
    pub snapshot_id: String,
    pub diagnostics: Vec<FileDiagnostic>,
    pub metrics: PipelineMetrics,
    pub progress: JobProgress,
    pub graph: Option<GraphDocument>,
    pub repomap: Option<RepoMap>,
}

impl PipelineReport {
    pub fn is_completed(&self) -> bool {
        matches!(self.run.state, RunState::Completed { .. })
    }

    pub fn is_cancelled_partial(&self) -> bool {
        matches!(self.run.state, RunState::CancelledPartial { .. })
    }
}

/// Output of one file's Parsing → IR → SemanticIR → Chunk chain
struct FileOutput {
    rel_path: String,
    doc: IRDocument,
    chunks: Vec<Chunk>,
    chunk_to_ir: ChunkToIr,
}

pub struct PipelineOrchestrator {
    config: IndexConfig,
    registry: Arc<ParserRegistry>,
    store: Arc<dyn SnapshotStore>,
    indexers: IndexerSet,
    retry: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
}

impl PipelineOrchestrator {
    pub fn new(config: IndexConfig, store: Arc<dyn SnapshotStore>) -> Result<Self> {
        config.validate().map_err(OrchestratorError::Config)?;
        Ok(Self {
            config,
            registry: Arc::new(ParserRegistry::with_default_plugins()),
            store,
            indexers: IndexerSet::none(),
            retry: RetryPolicy::default(),
            breaker: Arc::new(CircuitBreaker::default()),
        })
    }

    pub fn with_indexers(mut self, indexers: IndexerSet) -> Self {
        self.indexers = indexers;
        self
    }

    /// Run the full pipeline for one commit.
    pub async fn run(
        &self,
        root: &Path,
        repo_id: &str,
        commit: &str,
        options: RunOptions,
        cancel: CancellationToken,
    ) -> Result<PipelineReport> {
        let started = Instant::now();
        let dag = StageDag::new(default_stages())?;
        let mut run = PipelineRun::new(repo_id, commit);
        let mut diagnostics: Vec<FileDiagnostic> = Vec::new();
        let mut metrics = PipelineMetrics::default();
        let mut progress = options
            .resume
            .clone()
            .unwrap_or_else(|| JobProgress::new(repo_id, commit));

        run.start(StageId::Git.as_str())?;

        // ── Git: snapshot identity ──────────────────────────────────────
        if commit.is_empty() {
            let err = OrchestratorError::Config("Empty commit hash".to_string());
            run.fail(StageId::Git.as_str(), &err)?;
            return Err(err);
        }

        // ── Discovery ───────────────────────────────────────────────────
        run.advance_stage(StageId::Discovery.as_str())?;
        let previous = match &options.previous_snapshot {
            Some(prev) => Some(self.load_previous(prev).await?),
            None => None,
        };
        let discovery = Discovery::new(&self.config).discover(
            root,
            previous.as_ref().map(|(hashes, _)| hashes),
            previous.as_ref().and_then(|(_, index)| index.as_ref()),
            options.resume.as_ref(),
        )?;
        metrics.files_discovered = discovery.files.len();
        diagnostics.extend(discovery.skipped.iter().cloned());

        self.check_budget(started, &mut run)?;

        // ── Per-file fan-out: Parsing → IR → SemanticIR → Chunk ─────────
        run.advance_stage(StageId::Parsing.as_str())?;
        let chunk_builder = ChunkBuilder::new(repo_id, commit);
        let (outputs, file_diags) =
            self.run_per_file(repo_id, commit, &discovery.files, &chunk_builder, &cancel);
        diagnostics.extend(file_diags);
        metrics.files_processed = outputs.len();
        metrics.files_skipped = discovery.files.len().saturating_sub(outputs.len());
        for output in &outputs {
            progress.mark_completed(&output.rel_path);
        }

        if cancel.is_cancelled() {
            info!(
                processed = outputs.len(),
                remaining = discovery.files.len() - outputs.len(),
                "run cancelled, draining"
            );
            run.cancel_partial(progress.completed_count())?;
            metrics.duration_ms = started.elapsed().as_millis() as u64;
            return Ok(PipelineReport {
                run,
                snapshot_id: commit.to_string(),
                diagnostics,
                metrics,
                progress,
                graph: None,
                repomap: None,
            });
        }

        // ── Graph: the reducer ──────────────────────────────────────────
        run.advance_stage(StageId::Graph.as_str())?;
        self.check_budget(started, &mut run)?;
        let docs: Vec<IRDocument> = outputs.iter().map(|o| o.doc.clone()).collect();
        let graph = match GraphBuilder::new(repo_id, commit).build(&docs) {
            Ok(graph) => graph,
            Err(err) => {
                let err = OrchestratorError::Ir(err);
                run.fail(StageId::Graph.as_str(), &err)?;
                return Err(err);
            }
        };
        metrics.nodes_created = graph.nodes.len();
        metrics.edges_created = graph.edges.len();

        // ── Chunk finalization: importance + repo chunk + dependencies ──
        run.advance_stage(StageId::Chunk.as_str())?;
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut chunk_to_ir = ChunkToIr::new();
        for output in outputs {
            chunks.extend(output.chunks);
            chunk_to_ir.extend(output.chunk_to_ir);
        }
        let scores = PageRankEngine::new(PageRankSettings::with_damping(
            self.config.pagerank_damping,
        ))
        .compute(&graph);
        assign_importance(&mut chunks, &chunk_to_ir, &scores);

        if options.previous_snapshot.is_none() {
            let file_chunks: Vec<&Chunk> = chunks
                .iter()
                .filter(|c| c.level == codeatlas_ir::ChunkLevel::File)
                .collect();
            let repo_chunk = chunk_builder.build_repo_chunk(&file_chunks);
            chunks.push(repo_chunk);
        }
        metrics.chunks_created = chunks.len();

        let chunk_sizes: HashMap<String, u32> = chunks
            .iter()
            .map(|c| (c.chunk_id.clone(), c.line_count()))
            .collect();
        let dependencies = DependencyExtractor::extract(&graph, &chunk_to_ir, &chunk_sizes);

        // ── RepoMap ─────────────────────────────────────────────────────
        run.advance_stage(StageId::RepoMap.as_str())?;
        let repomap = RepoMapBuilder::new(repo_id, commit).build(&chunks);
        let repomap = match repomap.validate() {
            Ok(()) => Some(repomap),
            Err(errors) => {
                // Declared SkipStage: a malformed map is dropped, the run
                // continues
                debug_assert_eq!(
                    dag.spec(StageId::RepoMap).map(|s| s.fail_policy),
                    Some(crate::pipeline::FailPolicy::SkipStage)
                );
                warn!(?errors, "repomap validation failed, stage skipped");
                None
            }
        };

        // ── Indexing: persistence + external indexers ───────────────────
        run.advance_stage(StageId::Indexing.as_str())?;
        self.check_budget(started, &mut run)?;
        let index_result = self
            .run_indexing(
                repo_id,
                commit,
                &options,
                &discovery,
                &chunks,
                &dependencies,
            )
            .await;
        if let Err(err) = index_result {
            run.fail(StageId::Indexing.as_str(), &err)?;
            return Err(err);
        }

        run.complete(metrics.files_processed)?;
        metrics.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            repo_id,
            commit,
            files = metrics.files_processed,
            chunks = metrics.chunks_created,
            "pipeline completed"
        );
        Ok(PipelineReport {
            run,
            snapshot_id: commit.to_string(),
            diagnostics,
            metrics,
            progress,
            graph: Some(graph),
            repomap,
        })
    }

    /// Previous snapshot context: file hashes + reverse import index
    async fn load_previous(
        &self,
        previous_snapshot: &str,
    ) -> Result<(HashMap<String, String>, Option<ReverseImportIndex>)> {
        let hashes = self.store.get_file_metadata(previous_snapshot).await?;
        let deps = self.store.get_all_dependencies(previous_snapshot).await?;
        let chunks = self.store.get_all_chunks(previous_snapshot, false).await?;
        let index = (!deps.is_empty()).then(|| ReverseImportIndex::from_dependencies(&deps, &chunks));
        Ok((hashes, index))
    }

    /// The per-file chain with retry, executed on a bounded rayon pool.
    fn run_per_file(
        &self,
        repo_id: &str,
        commit: &str,
        files: &[DiscoveredFile],
        chunk_builder: &ChunkBuilder,
        cancel: &CancellationToken,
    ) -> (Vec<FileOutput>, Vec<FileDiagnostic>) {
        let workers = self.config.parallel_workers.min(num_cpus::get().max(1));
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .expect("worker pool construction cannot fail with validated config");

        let results: Vec<std::result::Result<FileOutput, FileDiagnostic>> = pool.install(|| {
            files
                .par_iter()
                .filter_map(|file| {
                    // Poll between files; in-flight work drains naturally
                    if cancel.is_cancelled() {
                        return None;
                    }
                    Some(self.process_file_with_retry(repo_id, commit, file, chunk_builder))
                })
                .collect()
        });

        let mut outputs = Vec::new();
        let mut diagnostics = Vec::new();
        for result in results {
            match result {
                Ok(output) => outputs.push(output),
                Err(diag) => diagnostics.push(diag),
            }
        }
        // Deterministic downstream order regardless of worker scheduling
        outputs.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        (outputs, diagnostics)
    }

    /// Transient file-local failures retry up to 3 times with 2ⁿ-second
    /// backoff; permanent failures (syntax, unsupported language) don't.
    fn process_file_with_retry(
        &self,
        repo_id: &str,
        commit: &str,
        file: &DiscoveredFile,
        chunk_builder: &ChunkBuilder,
    ) -> std::result::Result<FileOutput, FileDiagnostic> {
        let mut attempt = 0u32;
        loop {
            match self.process_file(repo_id, commit, file, chunk_builder) {
                Ok(output) => return Ok(output),
                Err(err) => {
                    if err.category() == ErrorCategory::Transient && attempt < 3 {
                        std::thread::sleep(std::time::Duration::from_secs(
                            2u64.saturating_pow(attempt),
                        ));
                        attempt += 1;
                        continue;
                    }
                    warn!(file = %file.rel_path, error = %err, "file skipped");
                    return Err(FileDiagnostic {
                        file_path: file.rel_path.clone(),
                        stage: stage_of(&err).to_string(),
                        error_kind: kind_of(&err),
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    fn process_file(
        &self,
        repo_id: &str,
        commit: &str,
        file: &DiscoveredFile,
        chunk_builder: &ChunkBuilder,
    ) -> Result<FileOutput> {
        let started = Instant::now();
        let bytes = std::fs::read(&file.abs_path)?;

        // Parsing (C1)
        let tree = self.registry.parse(&file.rel_path, &bytes)?;
        let plugin = self.registry.plugin_for_path(&file.rel_path)?;

        // IR (C2)
        let mut doc = IrGenerator::new(repo_id, commit).generate(&tree, plugin.as_ref());

        // SemanticIR (C3), mode-gated
        SemanticIrBuilder::new(self.config.mode).attach(&tree, plugin.as_ref(), &mut doc);

        let ir_budget = self
            .config
            .stage_timeouts
            .for_stage(StageId::Ir.as_str())
            .unwrap_or(self.config.stage_timeouts.ir_per_file);
        if started.elapsed() > ir_budget {
            return Err(OrchestratorError::Timeout {
                stage: StageId::Ir.as_str().to_string(),
                budget_secs: ir_budget.as_secs(),
            });
        }

        // Chunk (C5, per-file half)
        let chunk_started = Instant::now();
        let file_chunks = chunk_builder.build_file(&doc, &tree.source)?;
        if chunk_started.elapsed() > self.config.stage_timeouts.chunk_per_file {
            return Err(OrchestratorError::Timeout {
                stage: StageId::Chunk.as_str().to_string(),
                budget_secs: self.config.stage_timeouts.chunk_per_file.as_secs(),
            });
        }

        Ok(FileOutput {
            rel_path: file.rel_path.clone(),
            doc,
            chunks: file_chunks.chunks,
            chunk_to_ir: file_chunks.chunk_to_ir,
        })
    }

    /// Persist artifacts and feed external indexers.
    async fn run_indexing(
        &self,
        repo_id: &str,
        commit: &str,
        options: &RunOptions,
        discovery: &DiscoveryReport,
        chunks: &[Chunk],
        dependencies: &[ChunkDependency],
    ) -> Result<()> {
        let records: Vec<ChunkRecord> = chunks.iter().map(to_record).collect();

        match &options.previous_snapshot {
            None => {
                // Fresh snapshot: reject duplicates unless resuming into it
                match self.store.save_snapshot(&Snapshot::new(commit, repo_id)).await {
                    Ok(()) => {}
                    Err(StorageError {
                        kind: codeatlas_storage::ErrorKind::SnapshotExists,
                        ..
                    }) if options.resume.is_some() => {}
                    Err(err) => return Err(err.into()),
                }
                self.retry
                    .run("save_chunks", || async {
                        self.store.save_chunks(commit, &records).await.map_err(Into::into)
                    })
                    .await?;
            }
            Some(previous) => {
                // Incremental: one replace_file transition per re-indexed
                // file, empty chunk sets for tombstones
                let mut by_file: HashMap<&str, Vec<ChunkRecord>> = HashMap::new();
                for record in &records {
                    if record.file_path.is_empty() {
                        continue;
                    }
                    by_file
                        .entry(record.file_path.as_str())
                        .or_default()
                        .push(record.clone());
                }
                let mut paths: Vec<&str> = by_file.keys().copied().collect();
                paths.sort();
                for path in paths {
                    let file_records = by_file.remove(path).unwrap_or_default();
                    self.store
                        .replace_file(repo_id, previous, commit, path, file_records)
                        .await?;
                }
                for tombstone in &discovery.tombstones {
                    self.store
                        .replace_file(repo_id, previous, commit, tombstone, Vec::new())
                        .await?;
                }
            }
        }

        self.store
            .save_dependencies(
                commit,
                &dependencies
                    .iter()
                    .map(|d| StorageDependency {
                        id: d.id.clone(),
                        from_chunk_id: d.from_chunk_id.clone(),
                        to_chunk_id: d.to_chunk_id.clone(),
                        relationship: d.relationship.clone(),
                        confidence: d.confidence as f64,
                    })
                    .collect::<Vec<_>>(),
            )
            .await?;

        let file_metadata: Vec<FileMetadata> = discovery
            .file_hashes
            .iter()
            .map(|(path, hash)| FileMetadata {
                repo_id: repo_id.to_string(),
                snapshot_id: commit.to_string(),
                file_path: path.clone(),
                content_hash: hash.clone(),
            })
            .collect();
        self.store.save_file_metadata(&file_metadata).await?;

        // External indexers, breaker-guarded: the vector index is fed by
        // the embedding pipeline outside this core
        if let Some(lexical) = &self.indexers.lexical {
            let docs: Vec<LexicalDoc> = chunks
                .iter()
                .filter(|c| c.is_leaf())
                .map(|c| LexicalDoc {
                    chunk_id: c.chunk_id.clone(),
                    content: c.content.clone(),
                    file_path: c.file_path.clone(),
                    language: c.language.clone(),
                })
                .collect();
            let budget = self.config.stage_timeouts.lexical_batch;
            self.breaker
                .call("lexical", || async {
                    tokio::time::timeout(
                        budget,
                        self.retry
                            .run("lexical_index", || async { lexical.index(&docs).await }),
                    )
                    .await
                    .map_err(|_| OrchestratorError::Timeout {
                        stage: StageId::Indexing.as_str().to_string(),
                        budget_secs: budget.as_secs(),
                    })?
                })
                .await?;
        }
        if let Some(symbol) = &self.indexers.symbol {
            let docs: Vec<SymbolDoc> = chunks
                .iter()
                .filter(|c| !c.fqn.is_empty())
                .map(|c| SymbolDoc {
                    chunk_id: c.chunk_id.clone(),
                    fqn: c.fqn.clone(),
                    kind: c.level.as_str().to_string(),
                    file_path: c.file_path.clone(),
                    span: codeatlas_ir::Span::new(0, 0, c.start_line, 0, c.end_line, 0),
                })
                .collect();
            self.breaker
                .call("symbol", || async {
                    self.retry
                        .run("symbol_index", || async { symbol.index(&docs).await })
                        .await
                })
                .await?;
        }

        Ok(())
    }

    /// Whole-pipeline budget; exceeding it between stages is fatal.
    fn check_budget(&self, started: Instant, run: &mut PipelineRun) -> Result<()> {
        if started.elapsed() > self.config.stage_timeouts.pipeline {
            let err = OrchestratorError::Timeout {
                stage: "pipeline".to_string(),
                budget_secs: self.config.stage_timeouts.pipeline.as_secs(),
            };
            run.fail("pipeline", &err)?;
            return Err(err);
        }
        Ok(())
    }
}

fn to_record(chunk: &Chunk) -> ChunkRecord {
    let now = chrono::Utc::now();
    ChunkRecord {
        chunk_id: chunk.chunk_id.clone(),
        repo_id: chunk.repo_id.clone(),
        snapshot_id: chunk.snapshot_id.clone(),
        file_path: chunk.file_path.clone(),
        start_line: chunk.start_line,
        end_line: chunk.end_line,
        kind: match chunk.kind {
            codeatlas_ir::features::chunking::domain::ChunkKind::Leaf => "leaf".to_string(),
            codeatlas_ir::features::chunking::domain::ChunkKind::Parent => "parent".to_string(),
        },
        fqn: chunk.fqn.clone(),
        language: chunk.language.clone(),
        content: chunk.content.clone(),
        content_hash: chunk.content_hash.clone(),
        summary: chunk.summary.clone(),
        importance: chunk.importance as f64,
        is_deleted: chunk.is_deleted,
        attrs: serde_json::Value::Object(chunk.attrs.clone()),
        created_at: now,
        updated_at: now,
    }
}

fn stage_of(err: &OrchestratorError) -> &'static str {
    match err {
        OrchestratorError::Ir(ir) => match ir.kind {
            codeatlas_ir::ErrorKind::Parse | codeatlas_ir::ErrorKind::UnsupportedLanguage => {
                StageId::Parsing.as_str()
            }
            codeatlas_ir::ErrorKind::CfgBuild => StageId::SemanticIr.as_str(),
            codeatlas_ir::ErrorKind::ChunkSpanOutOfFile => StageId::Chunk.as_str(),
            _ => StageId::Ir.as_str(),
        },
        OrchestratorError::Timeout { .. } => StageId::Ir.as_str(),
        _ => StageId::Parsing.as_str(),
    }
}

fn kind_of(err: &OrchestratorError) -> String {
    match err {
        OrchestratorError::Ir(ir) => ir.kind.as_str().to_string(),
        OrchestratorError::Storage(storage) => storage.kind.as_str().to_string(),
        OrchestratorError::Timeout { .. } => "timeout".to_string(),
        OrchestratorError::Io(_) => "io".to_string(),
        OrchestratorError::Cancelled => "cancelled".to_string(),
        OrchestratorError::Config(_) => "config".to_string(),
        OrchestratorError::InvalidStateTransition { .. } => "invalid_state".to_string(),
        OrchestratorError::StageFailed { .. } => "stage_failed".to_string(),
    }
}
