//! Data flow: per-function DFGs

pub mod domain;
pub mod infrastructure;

pub use domain::{DataFlowEdge, DataFlowEdgeKind, DataFlowGraph, VariableEvent, VariableEventKind};
pub use infrastructure::DfgBuilder;
