//! Chunking domain models

mod chunk;
mod chunk_id_generator;

pub use chunk::{Chunk, ChunkDependency, ChunkKind, ChunkLevel};
pub use chunk_id_generator::ChunkIdGenerator;

/// Type aliases for chunk↔IR mappings
pub type ChunkId = String;
pub type ChunkToIr = std::collections::HashMap<ChunkId, Vec<crate::shared::models::NodeId>>;
