//! Data flow domain models

mod dfg;

pub use dfg::{DataFlowEdge, DataFlowEdgeKind, DataFlowGraph, VariableEvent, VariableEventKind};
