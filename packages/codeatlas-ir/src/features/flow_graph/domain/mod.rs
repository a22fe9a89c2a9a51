//! Flow graph domain models

mod cfg;

pub use cfg::{BasicBlock, BlockKind, CfgEdge, CfgEdgeKind, ControlFlowGraph};
