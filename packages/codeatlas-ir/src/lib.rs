//! codeatlas-ir: the code-intelligence indexing core
//!
//! Ingests file content, produces a language-neutral IR per file, merges
//! it into a repository-wide graph, and derives the chunk hierarchy and
//! RepoMap that downstream retrieval consumes.
//!
//! Components:
//! - `features::parsing`: parser registry and language plugins
//! - `features::ir_generation`: structural IR generator
//! - `features::flow_graph` / `features::data_flow` / `features::semantic_ir`: CFG and DFG layers
//! - `features::graph_builder`: snapshot graph reducer
//! - `features::chunking` / `features::repomap`: chunks, importance, repo map

pub mod config;
pub mod features;
pub mod shared;

pub use config::{IndexConfig, IndexMode, StageTimeouts};
pub use features::chunking::{Chunk, ChunkBuilder, ChunkDependency, ChunkLevel, ChunkToIr};
pub use features::graph_builder::{GraphBuilder, GraphDocument};
pub use features::ir_generation::{IRDocument, IrGenerator};
pub use features::parsing::{LanguageId, ParsedTree, ParserRegistry};
pub use features::repomap::{
    assign_importance, PageRankEngine, PageRankSettings, RepoMap, RepoMapBuilder,
};
pub use features::semantic_ir::SemanticIrBuilder;
pub use shared::models::{
    CodeatlasError, Edge, EdgeKind, ErrorKind, Node, NodeKind, Result, SignatureEntity, Span,
    TypeEntity,
};
