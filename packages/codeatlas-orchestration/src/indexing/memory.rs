//! In-memory reference indexers
//!
//! Used by tests and single-process runs; real deployments plug external
//! engines into the same ports.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{OrchestratorError, Result};

use super::ports::{LexicalDoc, LexicalIndexer, SymbolDoc, SymbolIndexer, VectorDoc, VectorIndexer};

/// Naive term-frequency lexical index
#[derive(Default)]
pub struct MemoryLexicalIndex {
    docs: RwLock<Vec<LexicalDoc>>,
}

impl MemoryLexicalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LexicalIndexer for MemoryLexicalIndex {
    async fn index(&self, docs: &[LexicalDoc]) -> Result<()> {
        let mut store = self.docs.write();
        for doc in docs {
            store.retain(|d| d.chunk_id != doc.chunk_id);
            store.push(doc.clone());
        }
        Ok(())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<(String, f32)>> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect();
        let store = self.docs.read();
        let mut scored: Vec<(String, f32)> = store
            .iter()
            .filter_map(|doc| {
                let haystack = doc.content.to_lowercase();
                let hits = terms
                    .iter()
                    .map(|t| haystack.matches(t.as_str()).count())
                    .sum::<usize>();
                (hits > 0).then(|| (doc.chunk_id.clone(), hits as f32))
            })
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(limit);
        Ok(scored)
    }
}

/// Brute-force cosine-similarity vector index with a fixed dimension
pub struct MemoryVectorIndex {
    dimension: usize,
    docs: RwLock<Vec<VectorDoc>>,
}

impl MemoryVectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            docs: RwLock::new(Vec::new()),
        }
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorIndexer for MemoryVectorIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn index(&self, docs: &[VectorDoc]) -> Result<()> {
        for doc in docs {
            if doc.vector.len() != self.dimension {
                return Err(OrchestratorError::Config(format!(
                    "Vector for {} has dimension {}, index expects {}",
                    doc.chunk_id,
                    doc.vector.len(),
                    self.dimension
                )));
            }
        }
        let mut store = self.docs.write();
        for doc in docs {
            store.retain(|d| d.chunk_id != doc.chunk_id);
            store.push(doc.clone());
        }
        Ok(())
    }

    async fn knn(&self, vector: &[f32], k: usize) -> Result<Vec<(String, f32)>> {
        let store = self.docs.read();
        let mut scored: Vec<(String, f32)> = store
            .iter()
            .map(|doc| (doc.chunk_id.clone(), cosine(vector, &doc.vector)))
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(k);
        Ok(scored)
    }
}

/// FQN-keyed symbol index
#[derive(Default)]
pub struct MemorySymbolIndex {
    by_fqn: RwLock<HashMap<String, Vec<SymbolDoc>>>,
}

impl MemorySymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SymbolIndexer for MemorySymbolIndex {
    async fn index(&self, docs: &[SymbolDoc]) -> Result<()> {
        let mut store = self.by_fqn.write();
        for doc in docs {
            let entry = store.entry(doc.fqn.clone()).or_default();
            entry.retain(|d| d.chunk_id != doc.chunk_id);
            entry.push(doc.clone());
        }
        Ok(())
    }

    async fn find_definition(&self, fqn: &str) -> Result<Option<SymbolDoc>> {
        Ok(self
            .by_fqn
            .read()
            .get(fqn)
            .and_then(|docs| docs.first().cloned()))
    }

    async fn find_references(&self, fqn: &str) -> Result<Vec<SymbolDoc>> {
        Ok(self.by_fqn.read().get(fqn).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codeatlas_ir::Span;

    #[tokio::test]
    async fn test_lexical_search_ranks_by_hits() {
        let index = MemoryLexicalIndex::new();
        index
            .index(&[
                LexicalDoc {
                    chunk_id: "c1".to_string(),
                    content: "parse the parser with a parser".to_string(),
                    file_path: "a.py".to_string(),
                    language: "python".to_string(),
                },
                LexicalDoc {
                    chunk_id: "c2".to_string(),
                    content: "one parser mention".to_string(),
                    file_path: "b.py".to_string(),
                    language: "python".to_string(),
                },
            ])
            .await
            .unwrap();

        let hits = index.search("parser", 10).await.unwrap();
        assert_eq!(hits[0].0, "c1");
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_vector_dimension_enforced() {
        let index = MemoryVectorIndex::new(3);
        let err = index
            .index(&[VectorDoc {
                chunk_id: "c1".to_string(),
                vector: vec![1.0, 2.0],
                payload: serde_json::Value::Null,
            }])
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_knn_returns_nearest() {
        let index = MemoryVectorIndex::new(2);
        index
            .index(&[
                VectorDoc {
                    chunk_id: "x".to_string(),
                    vector: vec![1.0, 0.0],
                    payload: serde_json::Value::Null,
                },
                VectorDoc {
                    chunk_id: "y".to_string(),
                    vector: vec![0.0, 1.0],
                    payload: serde_json::Value::Null,
                },
            ])
            .await
            .unwrap();

        let hits = index.knn(&[0.9, 0.1], 1).await.unwrap();
        assert_eq!(hits[0].0, "x");
    }

    #[tokio::test]
    async fn test_symbol_lookup() {
        let index = MemorySymbolIndex::new();
        index
            .index(&[SymbolDoc {
                chunk_id: "c1".to_string(),
                fqn: "a.foo".to_string(),
                kind: "function".to_string(),
                file_path: "a.py".to_string(),
                span: Span::zero(),
            }])
            .await
            .unwrap();

        assert!(index.find_definition("a.foo").await.unwrap().is_some());
        assert!(index.find_definition("a.bar").await.unwrap().is_none());
        assert_eq!(index.find_references("a.foo").await.unwrap().len(), 1);
    }
}
