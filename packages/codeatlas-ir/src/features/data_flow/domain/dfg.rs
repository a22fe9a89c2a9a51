//! Data flow graph domain model
//!
//! Layered on the CFG: per-block variable read/write events and def-use
//! edges between `VariableEntity` occurrences of one function.

use serde::{Deserialize, Serialize};

use crate::shared::models::{Span, VariableEntity};

/// Variable event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableEventKind {
    Read,
    Write,
}

/// A read or write of a variable within a block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableEvent {
    pub variable_id: String,
    pub kind: VariableEventKind,
    pub block_idx: usize,
    pub span: Span,
    /// IR node the event belongs to (the enclosing function node)
    pub owner_node_id: String,
}

/// Data flow edge kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataFlowEdgeKind {
    /// `a = b`
    Alias,
    /// `a = f(b)` and other computed assignments
    Assign,
    /// caller argument → callee formal
    ParamToArg,
    /// `return a`
    ReturnValue,
}

/// Def-use edge between variable ids of the same function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFlowEdge {
    pub source_var_id: String,
    pub target_var_id: String,
    pub kind: DataFlowEdgeKind,
}

/// Data flow graph of one function
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataFlowGraph {
    pub function_node_id: String,
    pub variables: Vec<VariableEntity>,
    pub events: Vec<VariableEvent>,
    pub edges: Vec<DataFlowEdge>,
}

impl DataFlowGraph {
    pub fn new(function_node_id: impl Into<String>) -> Self {
        Self {
            function_node_id: function_node_id.into(),
            ..Default::default()
        }
    }

    pub fn variable(&self, id: &str) -> Option<&VariableEntity> {
        self.variables.iter().find(|v| v.id == id)
    }

    /// Both endpoints of every edge must be variables of this function
    pub fn validate(&self) -> bool {
        self.edges.iter().all(|e| {
            self.variable(&e.source_var_id).is_some() && self.variable(&e.target_var_id).is_some()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_dangling_edge() {
        let mut dfg = DataFlowGraph::new("fn1");
        dfg.edges.push(DataFlowEdge {
            source_var_id: "var:r:f:fn:x@0:0".to_string(),
            target_var_id: "var:r:f:fn:y@0:0".to_string(),
            kind: DataFlowEdgeKind::Alias,
        });
        assert!(!dfg.validate());
    }
}
