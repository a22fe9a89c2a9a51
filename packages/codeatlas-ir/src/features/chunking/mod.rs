//! Chunking: hierarchical retrieval chunks

pub mod domain;
pub mod infrastructure;

pub use domain::{Chunk, ChunkDependency, ChunkId, ChunkIdGenerator, ChunkKind, ChunkLevel, ChunkToIr};
pub use infrastructure::{ChunkBuilder, DependencyExtractor, FileChunks};
