//! External indexer ports
//!
//! The lexical, vector, and symbol indexes are external collaborators: the
//! core hands them chunk-keyed records and queries them by id. All three
//! are async and wrapped with bounded retry and circuit breaking at the
//! Indexing stage.

use async_trait::async_trait;

use codeatlas_ir::Span;

use crate::error::Result;

/// Document handed to the lexical index
#[derive(Debug, Clone)]
pub struct LexicalDoc {
    pub chunk_id: String,
    pub content: String,
    pub file_path: String,
    pub language: String,
}

/// Lexical (full-text) index port
#[async_trait]
pub trait LexicalIndexer: Send + Sync {
    async fn index(&self, docs: &[LexicalDoc]) -> Result<()>;

    /// Ranked chunk ids for a query
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<(String, f32)>>;
}

/// Embedding record handed to the vector index
#[derive(Debug, Clone)]
pub struct VectorDoc {
    pub chunk_id: String,
    pub vector: Vec<f32>,
    pub payload: serde_json::Value,
}

/// Vector (k-NN) index port; the vector dimension is fixed per deployment
#[async_trait]
pub trait VectorIndexer: Send + Sync {
    fn dimension(&self) -> usize;

    async fn index(&self, docs: &[VectorDoc]) -> Result<()>;

    async fn knn(&self, vector: &[f32], k: usize) -> Result<Vec<(String, f32)>>;
}

/// Symbol record handed to the symbol index
#[derive(Debug, Clone)]
pub struct SymbolDoc {
    pub chunk_id: String,
    pub fqn: String,
    pub kind: String,
    pub file_path: String,
    pub span: Span,
}

/// Symbol index port
#[async_trait]
pub trait SymbolIndexer: Send + Sync {
    async fn index(&self, docs: &[SymbolDoc]) -> Result<()>;

    async fn find_definition(&self, fqn: &str) -> Result<Option<SymbolDoc>>;

    async fn find_references(&self, fqn: &str) -> Result<Vec<SymbolDoc>>;
}
