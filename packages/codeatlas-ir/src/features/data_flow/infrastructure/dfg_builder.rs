//! DFG construction over a lowered function
//!
//! For each statement the analyzer extracts (reads, writes); every write
//! creates a fresh variable version, reads resolve to the most recent
//! write in the same block, else to the join of last writes along all
//! predecessor paths (one edge per source). A read with no visible write
//! introduces a new local.

use std::collections::HashMap;

use crate::features::flow_graph::infrastructure::LoweredFunction;
use crate::features::parsing::domain::{SyntaxKind, SyntaxNode};
use crate::shared::models::VariableEntity;

use super::super::domain::{
    DataFlowEdge, DataFlowEdgeKind, DataFlowGraph, VariableEvent, VariableEventKind,
};

/// DFG builder for one function
pub struct DfgBuilder<'a> {
    repo_id: &'a str,
    file_path: &'a str,
    func_fqn: &'a str,
    source: &'a str,
}

/// Last write per (block, name) while sweeping the CFG
#[derive(Default)]
struct WriteState {
    /// (block_idx, name) → variable id of the latest write in that block
    last_write_in_block: HashMap<(usize, String), String>,
    /// name → total writes seen (drives shadow_cnt)
    write_counts: HashMap<String, u32>,
}

impl<'a> DfgBuilder<'a> {
    pub fn new(
        repo_id: &'a str,
        file_path: &'a str,
        func_fqn: &'a str,
        source: &'a str,
    ) -> Self {
        Self {
            repo_id,
            file_path,
            func_fqn,
            source,
        }
    }

    pub fn build(&self, lowered: &LoweredFunction<'_>, param_names: &[String]) -> DataFlowGraph {
        let cfg = &lowered.cfg;
        let mut dfg = DataFlowGraph::new(cfg.function_node_id.clone());
        let mut state = WriteState::default();

        // Parameters are writes in the entry block
        for name in param_names {
            let var_id = self.new_version(&mut dfg, &mut state, name, cfg.entry_idx);
            dfg.events.push(VariableEvent {
                variable_id: var_id,
                kind: VariableEventKind::Write,
                block_idx: cfg.entry_idx,
                span: cfg.blocks[cfg.entry_idx].span,
                owner_node_id: cfg.function_node_id.clone(),
            });
        }

        // Blocks are swept in index order; the lowering emits them in
        // control-flow order, which keeps the sweep deterministic
        for (block_idx, stmts) in lowered.block_stmts.iter().enumerate() {
            for stmt in stmts {
                let stmt = unwrap_expression_statement(stmt);
                let (reads, writes, is_return) = extract_reads_writes(stmt, self.source);

                let read_ids: Vec<String> = reads
                    .iter()
                    .flat_map(|name| self.resolve_read(&mut dfg, &mut state, cfg, name, block_idx))
                    .collect();
                for id in &read_ids {
                    dfg.events.push(VariableEvent {
                        variable_id: id.clone(),
                        kind: VariableEventKind::Read,
                        block_idx,
                        span: stmt.span,
                        owner_node_id: cfg.function_node_id.clone(),
                    });
                }

                if is_return {
                    // `return a` feeds the synthetic return slot
                    let ret_id =
                        self.new_version(&mut dfg, &mut state, "<return>", block_idx);
                    for source_id in &read_ids {
                        dfg.edges.push(DataFlowEdge {
                            source_var_id: source_id.clone(),
                            target_var_id: ret_id.clone(),
                            kind: DataFlowEdgeKind::ReturnValue,
                        });
                    }
                    continue;
                }

                for name in &writes {
                    let target_id = self.new_version(&mut dfg, &mut state, name, block_idx);
                    dfg.events.push(VariableEvent {
                        variable_id: target_id.clone(),
                        kind: VariableEventKind::Write,
                        block_idx,
                        span: stmt.span,
                        owner_node_id: cfg.function_node_id.clone(),
                    });
                    // `a = b` is an alias; anything computed is an assign
                    let kind = if read_ids.len() == 1 && is_bare_name_rhs(stmt, self.source) {
                        DataFlowEdgeKind::Alias
                    } else {
                        DataFlowEdgeKind::Assign
                    };
                    for source_id in &read_ids {
                        dfg.edges.push(DataFlowEdge {
                            source_var_id: source_id.clone(),
                            target_var_id: target_id.clone(),
                            kind,
                        });
                    }
                }
            }
        }

        dfg
    }

    fn new_version(
        &self,
        dfg: &mut DataFlowGraph,
        state: &mut WriteState,
        name: &str,
        block_idx: usize,
    ) -> String {
        let shadow = state.write_counts.entry(name.to_string()).or_insert(0);
        let id = VariableEntity::compute_id(
            self.repo_id,
            self.file_path,
            self.func_fqn,
            name,
            block_idx,
            *shadow,
        );
        *shadow += 1;
        state
            .last_write_in_block
            .insert((block_idx, name.to_string()), id.clone());
        dfg.variables.push(VariableEntity {
            id: id.clone(),
            name: name.to_string(),
            function_node_id: dfg.function_node_id.clone(),
            block_idx,
            shadow_cnt: *shadow - 1,
            declared_type_id: None,
        });
        id
    }

    /// Most recent write in this block, else the join of last writes along
    /// all predecessor paths (may yield several sources, one edge each),
    /// else a fresh local.
    fn resolve_read(
        &self,
        dfg: &mut DataFlowGraph,
        state: &mut WriteState,
        cfg: &crate::features::flow_graph::domain::ControlFlowGraph,
        name: &str,
        block_idx: usize,
    ) -> Vec<String> {
        if let Some(id) = state
            .last_write_in_block
            .get(&(block_idx, name.to_string()))
        {
            return vec![id.clone()];
        }
        // Backward BFS over predecessors; first write found on each path
        let mut sources = Vec::new();
        let mut visited = vec![false; cfg.blocks.len()];
        let mut queue = cfg.predecessors(block_idx);
        while let Some(pred) = queue.pop() {
            if visited[pred] {
                continue;
            }
            visited[pred] = true;
            if let Some(id) = state.last_write_in_block.get(&(pred, name.to_string())) {
                sources.push(id.clone());
            } else {
                queue.extend(cfg.predecessors(pred));
            }
        }
        if sources.is_empty() {
            return vec![self.new_version(dfg, state, name, block_idx)];
        }
        sources.sort();
        sources.dedup();
        sources
    }
}

/// Statement-level grammars wrap assignments/calls in expression_statement
fn unwrap_expression_statement(stmt: &SyntaxNode) -> &SyntaxNode {
    if stmt.raw_kind == "expression_statement" {
        if let Some(inner) = stmt.children.iter().find(|c| c.is_named) {
            return inner;
        }
    }
    stmt
}

/// Extract (reads, writes, is_return) for one statement
fn extract_reads_writes(stmt: &SyntaxNode, source: &str) -> (Vec<String>, Vec<String>, bool) {
    let mut reads = Vec::new();
    let mut writes = Vec::new();
    let mut is_return = false;

    match &stmt.kind {
        SyntaxKind::AssignmentStmt | SyntaxKind::AugAssignmentStmt => {
            if let Some(left) = stmt.child_by_field("left") {
                collect_names(left, source, &mut writes);
            }
            if let Some(right) = stmt
                .child_by_field("right")
                .or_else(|| stmt.child_by_field("value"))
            {
                collect_names(right, source, &mut reads);
            }
            if stmt.kind == SyntaxKind::AugAssignmentStmt {
                reads.extend(writes.iter().cloned());
            }
        }
        SyntaxKind::ReturnStmt => {
            is_return = true;
            for child in &stmt.children {
                collect_names(child, source, &mut reads);
            }
        }
        _ => {
            // Expression statements: every identifier is a read
            for child in &stmt.children {
                collect_names(child, source, &mut reads);
            }
        }
    }

    reads.dedup();
    writes.dedup();
    (reads, writes, is_return)
}

/// Collect identifier names, skipping call callee names
fn collect_names(node: &SyntaxNode, source: &str, out: &mut Vec<String>) {
    match &node.kind {
        SyntaxKind::NameExpr => {
            let text = node.text(source);
            if !text.is_empty() {
                out.push(text.to_string());
            }
        }
        SyntaxKind::CallExpr => {
            // Arguments are reads; the callee is a CALLS relation, not data flow
            if let Some(args) = node.child_by_field("arguments") {
                for arg in &args.children {
                    collect_names(arg, source, out);
                }
            }
        }
        SyntaxKind::LambdaDef => {}
        _ => {
            for child in &node.children {
                collect_names(child, source, out);
            }
        }
    }
}

/// `a = b` (RHS is exactly one bare identifier)
fn is_bare_name_rhs(stmt: &SyntaxNode, _source: &str) -> bool {
    stmt.child_by_field("right")
        .or_else(|| stmt.child_by_field("value"))
        .is_some_and(|rhs| rhs.kind == SyntaxKind::NameExpr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::flow_graph::infrastructure::CfgBuilder;
    use crate::features::parsing::domain::ParsedTree;
    use crate::features::parsing::infrastructure::ParserRegistry;

    fn lower(source: &str) -> (ParsedTree, Vec<String>) {
        let tree = ParserRegistry::with_default_plugins()
            .parse("test.py", source.as_bytes())
            .unwrap();
        let registry = ParserRegistry::with_default_plugins();
        let plugin = registry.plugin_for_path("test.py").unwrap();
        let func = tree
            .root
            .children
            .iter()
            .find(|c| c.kind == SyntaxKind::FunctionDef)
            .unwrap();
        let params = plugin
            .parameters(func, &tree.source)
            .into_iter()
            .map(|p| p.name)
            .collect();
        (tree, params)
    }

    fn build_dfg(source: &str) -> DataFlowGraph {
        let (tree, params) = lower(source);
        let func = tree
            .root
            .children
            .iter()
            .find(|c| c.kind == SyntaxKind::FunctionDef)
            .unwrap();
        let body = func.child_by_field("body").unwrap();
        let lowered = CfgBuilder::new("fn1", &tree.source, None).build(body).unwrap();
        DfgBuilder::new("repo", "test.py", "test.f", &tree.source).build(&lowered, &params)
    }

    #[test]
    fn test_alias_edge() {
        let dfg = build_dfg("def f(b):\n    a = b\n    return a\n");
        assert!(dfg
            .edges
            .iter()
            .any(|e| e.kind == DataFlowEdgeKind::Alias));
        assert!(dfg.validate());
    }

    #[test]
    fn test_assign_edge_for_computed_rhs() {
        let dfg = build_dfg("def f(b):\n    a = g(b) + 1\n    return a\n");
        assert!(dfg
            .edges
            .iter()
            .any(|e| e.kind == DataFlowEdgeKind::Assign));
    }

    #[test]
    fn test_return_value_edge() {
        let dfg = build_dfg("def f(x):\n    return x\n");
        let ret_edge = dfg
            .edges
            .iter()
            .find(|e| e.kind == DataFlowEdgeKind::ReturnValue)
            .unwrap();
        let source_var = dfg.variable(&ret_edge.source_var_id).unwrap();
        assert_eq!(source_var.name, "x");
    }

    #[test]
    fn test_shadow_count_increments() {
        let dfg = build_dfg("def f():\n    x = 1\n    x = 2\n    return x\n");
        let versions: Vec<_> = dfg.variables.iter().filter(|v| v.name == "x").collect();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].shadow_cnt, 0);
        assert_eq!(versions[1].shadow_cnt, 1);
    }

    #[test]
    fn test_unwritten_read_introduces_local() {
        let dfg = build_dfg("def f():\n    return unknown_global\n");
        assert!(dfg.variables.iter().any(|v| v.name == "unknown_global"));
    }

    #[test]
    fn test_variable_id_format() {
        let dfg = build_dfg("def f():\n    x = 1\n    return x\n");
        let x = dfg.variables.iter().find(|v| v.name == "x").unwrap();
        assert!(x.id.starts_with("var:repo:test.py:test.f:x@"));
    }
}
