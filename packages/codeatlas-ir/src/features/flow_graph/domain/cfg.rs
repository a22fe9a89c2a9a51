//! Control flow graph domain model
//!
//! Basic blocks are maximal straight-line statement sequences; entry and
//! exit blocks are synthetic. Condition text is attached to the block the
//! branch originates from.

use serde::{Deserialize, Serialize};

use crate::shared::models::Span;

/// Basic block kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Synthetic entry block
    Entry,
    /// Synthetic exit block
    Exit,
    /// Straight-line statements
    Statement,
    /// Branch source (if/match condition)
    Condition,
    /// Loop header
    LoopHeader,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Entry => "ENTRY",
            BlockKind::Exit => "EXIT",
            BlockKind::Statement => "STATEMENT",
            BlockKind::Condition => "CONDITION",
            BlockKind::LoopHeader => "LOOP_HEADER",
        }
    }
}

/// A basic block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicBlock {
    /// Index within the function's CFG; block ids are `{function_id}#{idx}`
    pub idx: usize,
    pub kind: BlockKind,
    pub span: Span,
    /// Spans of the statements folded into this block
    pub statement_spans: Vec<Span>,
    /// Condition expression text for Condition/LoopHeader blocks
    pub condition_text: Option<String>,
}

impl BasicBlock {
    pub fn new(idx: usize, kind: BlockKind, span: Span) -> Self {
        Self {
            idx,
            kind,
            span,
            statement_spans: Vec::new(),
            condition_text: None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self.kind, BlockKind::Entry | BlockKind::Exit)
    }
}

/// CFG edge kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CfgEdgeKind {
    True,
    False,
    Unconditional,
    Exception,
}

impl CfgEdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CfgEdgeKind::True => "TRUE",
            CfgEdgeKind::False => "FALSE",
            CfgEdgeKind::Unconditional => "UNCONDITIONAL",
            CfgEdgeKind::Exception => "EXCEPTION",
        }
    }
}

/// CFG edge between block indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgEdge {
    pub source_idx: usize,
    pub target_idx: usize,
    pub kind: CfgEdgeKind,
}

/// Control flow graph of one function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlFlowGraph {
    pub function_node_id: String,
    pub blocks: Vec<BasicBlock>,
    pub edges: Vec<CfgEdge>,
    pub entry_idx: usize,
    pub exit_idx: usize,
}

impl ControlFlowGraph {
    pub fn block_id(&self, idx: usize) -> String {
        format!("{}#{}", self.function_node_id, idx)
    }

    pub fn predecessors(&self, idx: usize) -> Vec<usize> {
        self.edges
            .iter()
            .filter(|e| e.target_idx == idx)
            .map(|e| e.source_idx)
            .collect()
    }

    pub fn successors(&self, idx: usize) -> Vec<usize> {
        self.edges
            .iter()
            .filter(|e| e.source_idx == idx)
            .map(|e| e.target_idx)
            .collect()
    }

    /// Edges out of condition blocks must come in true/false pairs;
    /// checked by tests, advisory at runtime.
    pub fn branch_edge_count(&self) -> usize {
        self.edges
            .iter()
            .filter(|e| matches!(e.kind, CfgEdgeKind::True | CfgEdgeKind::False))
            .count()
    }
}
