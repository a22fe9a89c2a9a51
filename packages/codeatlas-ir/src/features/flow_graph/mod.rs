//! Flow graph: per-function CFGs

pub mod domain;
pub mod infrastructure;

pub use domain::{BasicBlock, BlockKind, CfgEdge, CfgEdgeKind, ControlFlowGraph};
pub use infrastructure::{CfgBuilder, LoweredFunction};
