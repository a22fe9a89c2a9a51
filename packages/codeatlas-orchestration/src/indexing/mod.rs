//! Indexing stage collaborators: ports, resilience, reference impls

mod memory;
mod ports;
mod resilience;

pub use memory::{MemoryLexicalIndex, MemorySymbolIndex, MemoryVectorIndex};
pub use ports::{
    LexicalDoc, LexicalIndexer, SymbolDoc, SymbolIndexer, VectorDoc, VectorIndexer,
};
pub use resilience::{BreakerState, CircuitBreaker, RetryPolicy};

use std::sync::Arc;

/// The indexer collaborators handed to the orchestrator. Any of them may
/// be absent; the Indexing stage feeds whichever are present.
#[derive(Clone, Default)]
pub struct IndexerSet {
    pub lexical: Option<Arc<dyn LexicalIndexer>>,
    pub vector: Option<Arc<dyn VectorIndexer>>,
    pub symbol: Option<Arc<dyn SymbolIndexer>>,
}

impl IndexerSet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_lexical(mut self, indexer: Arc<dyn LexicalIndexer>) -> Self {
        self.lexical = Some(indexer);
        self
    }

    pub fn with_vector(mut self, indexer: Arc<dyn VectorIndexer>) -> Self {
        self.vector = Some(indexer);
        self
    }

    pub fn with_symbol(mut self, indexer: Arc<dyn SymbolIndexer>) -> Self {
        self.symbol = Some(indexer);
        self
    }
}
