//! CFG construction from a function body
//!
//! Lowers the statement tree into basic blocks: maximal straight-line
//! sequences, with Condition/LoopHeader blocks at branch points and
//! synthetic Entry/Exit blocks. Pending fall-through edges carry their
//! kind until the next block entry is known.

use crate::features::parsing::domain::{SyntaxKind, SyntaxNode};
use crate::shared::models::{CodeatlasError, Result, Span};

use super::super::domain::{BasicBlock, BlockKind, CfgEdge, CfgEdgeKind, ControlFlowGraph};

/// A function lowered to blocks, keeping the statement nodes per block for
/// the data-flow layer.
pub struct LoweredFunction<'a> {
    pub cfg: ControlFlowGraph,
    pub block_stmts: Vec<Vec<&'a SyntaxNode>>,
}

/// CFG builder for one function
pub struct CfgBuilder<'a> {
    function_node_id: String,
    source: &'a str,
    /// Hard cap on blocks per function (mode-gated); None = unbounded
    max_blocks: Option<usize>,

    blocks: Vec<BasicBlock>,
    block_stmts: Vec<Vec<&'a SyntaxNode>>,
    edges: Vec<CfgEdge>,
    /// Blocks that exit the function (return/raise); wired to Exit at the end
    returns: Vec<(usize, CfgEdgeKind)>,
}

/// Dangling edges waiting for their target block
type Pending = Vec<(usize, CfgEdgeKind)>;

impl<'a> CfgBuilder<'a> {
    pub fn new(
        function_node_id: impl Into<String>,
        source: &'a str,
        max_blocks: Option<usize>,
    ) -> Self {
        Self {
            function_node_id: function_node_id.into(),
            source,
            max_blocks,
            blocks: Vec::new(),
            block_stmts: Vec::new(),
            edges: Vec::new(),
            returns: Vec::new(),
        }
    }

    pub fn build(mut self, body: &'a SyntaxNode) -> Result<LoweredFunction<'a>> {
        let entry_idx = self.new_block(BlockKind::Entry, body.span)?;

        let (_body_entry, body_exits) =
            self.lower_stmts(&body.children, vec![(entry_idx, CfgEdgeKind::Unconditional)])?;

        let exit_idx = self.new_block(BlockKind::Exit, body.span)?;
        for (idx, kind) in body_exits {
            self.edges.push(CfgEdge {
                source_idx: idx,
                target_idx: exit_idx,
                kind,
            });
        }
        for (idx, kind) in std::mem::take(&mut self.returns) {
            self.edges.push(CfgEdge {
                source_idx: idx,
                target_idx: exit_idx,
                kind,
            });
        }

        Ok(LoweredFunction {
            cfg: ControlFlowGraph {
                function_node_id: self.function_node_id,
                blocks: self.blocks,
                edges: self.edges,
                entry_idx,
                exit_idx,
            },
            block_stmts: self.block_stmts,
        })
    }

    fn new_block(&mut self, kind: BlockKind, span: Span) -> Result<usize> {
        if let Some(max) = self.max_blocks {
            if self.blocks.len() >= max {
                return Err(CodeatlasError::cfg_build(format!(
                    "Function exceeds {} basic blocks",
                    max
                )));
            }
        }
        let idx = self.blocks.len();
        self.blocks.push(BasicBlock::new(idx, kind, span));
        self.block_stmts.push(Vec::new());
        Ok(idx)
    }

    fn connect(&mut self, pending: Pending, target: usize) {
        for (source, kind) in pending {
            self.edges.push(CfgEdge {
                source_idx: source,
                target_idx: target,
                kind,
            });
        }
    }

    /// Lower a statement sequence. Takes the dangling edges that should
    /// enter the sequence, returns (entry block if any, dangling exits).
    fn lower_stmts(
        &mut self,
        stmts: &'a [SyntaxNode],
        mut pending: Pending,
    ) -> Result<(Option<usize>, Pending)> {
        let mut entry = None;
        // Current straight-line block, extended until a branch point
        let mut current: Option<usize> = None;

        for stmt in stmts {
            match &stmt.kind {
                // Nested definitions get their own CFGs
                SyntaxKind::FunctionDef
                | SyntaxKind::MethodDef
                | SyntaxKind::ClassDef
                | SyntaxKind::Comment => continue,

                SyntaxKind::IfStmt => {
                    current = None;
                    let cond_idx = self.new_block(BlockKind::Condition, stmt.span)?;
                    self.blocks[cond_idx].condition_text = stmt
                        .child_by_field("condition")
                        .map(|c| c.text(self.source).to_string());
                    self.connect(std::mem::take(&mut pending), cond_idx);
                    entry.get_or_insert(cond_idx);

                    let consequence = stmt
                        .child_by_field("consequence")
                        .or_else(|| stmt.child_by_field("body"));
                    let mut exits: Pending = Vec::new();

                    if let Some(then_branch) = consequence {
                        let (then_entry, then_exits) = self.lower_stmts(
                            std::slice::from_ref(then_branch),
                            vec![(cond_idx, CfgEdgeKind::True)],
                        )?;
                        if then_entry.is_none() {
                            exits.push((cond_idx, CfgEdgeKind::True));
                        }
                        exits.extend(then_exits);
                    } else {
                        exits.push((cond_idx, CfgEdgeKind::True));
                    }

                    if let Some(alternative) = stmt.child_by_field("alternative") {
                        let (else_entry, else_exits) = self.lower_stmts(
                            std::slice::from_ref(alternative),
                            vec![(cond_idx, CfgEdgeKind::False)],
                        )?;
                        if else_entry.is_none() {
                            exits.push((cond_idx, CfgEdgeKind::False));
                        }
                        exits.extend(else_exits);
                    } else {
                        exits.push((cond_idx, CfgEdgeKind::False));
                    }
                    pending = exits;
                }

                SyntaxKind::ForStmt | SyntaxKind::WhileStmt => {
                    current = None;
                    let header_idx = self.new_block(BlockKind::LoopHeader, stmt.span)?;
                    self.blocks[header_idx].condition_text = stmt
                        .child_by_field("condition")
                        .or_else(|| stmt.child_by_field("right"))
                        .map(|c| c.text(self.source).to_string());
                    self.connect(std::mem::take(&mut pending), header_idx);
                    entry.get_or_insert(header_idx);

                    let body = stmt.child_by_field("body");
                    if let Some(body) = body {
                        let (body_entry, body_exits) = self.lower_stmts(
                            std::slice::from_ref(body),
                            vec![(header_idx, CfgEdgeKind::True)],
                        )?;
                        // Back edges to the header
                        if body_entry.is_some() {
                            self.connect(body_exits, header_idx);
                        }
                    }
                    pending = vec![(header_idx, CfgEdgeKind::False)];
                }

                SyntaxKind::TryStmt => {
                    current = None;
                    let body = stmt.child_by_field("body");
                    let mut exits: Pending = Vec::new();
                    let mut try_entry = None;

                    if let Some(body) = body {
                        let (body_entry, body_exits) = self
                            .lower_stmts(std::slice::from_ref(body), std::mem::take(&mut pending))?;
                        try_entry = body_entry;
                        exits.extend(body_exits);
                    }

                    // Handler clauses: reached by Exception edges from the
                    // protected entry block
                    for clause in stmt.children.iter().filter(|c| {
                        matches!(
                            c.raw_kind.as_str(),
                            "except_clause" | "catch_clause" | "finally_clause"
                        )
                    }) {
                        let handler_pending = match try_entry {
                            Some(entry_idx) => vec![(entry_idx, CfgEdgeKind::Exception)],
                            None => Vec::new(),
                        };
                        let (_, handler_exits) =
                            self.lower_stmts(std::slice::from_ref(clause), handler_pending)?;
                        exits.extend(handler_exits);
                    }
                    entry = entry.or(try_entry);
                    pending = exits;
                }

                SyntaxKind::ReturnStmt => {
                    let idx = self.append_stmt(stmt, &mut current, &mut pending, &mut entry)?;
                    self.returns.push((idx, CfgEdgeKind::Unconditional));
                    current = None;
                    pending = Vec::new();
                }

                SyntaxKind::RaiseStmt => {
                    let idx = self.append_stmt(stmt, &mut current, &mut pending, &mut entry)?;
                    self.returns.push((idx, CfgEdgeKind::Exception));
                    current = None;
                    pending = Vec::new();
                }

                // Transparent containers (bare blocks, else-clauses)
                SyntaxKind::Block => {
                    current = None;
                    let (block_entry, block_exits) =
                        self.lower_stmts(&stmt.children, std::mem::take(&mut pending))?;
                    entry = entry.or(block_entry);
                    pending = block_exits;
                }

                _ => {
                    if matches!(
                        stmt.raw_kind.as_str(),
                        "else_clause" | "elif_clause" | "except_clause" | "catch_clause"
                            | "finally_clause"
                    ) {
                        // Clause wrappers delegate to their inner block
                        current = None;
                        let (block_entry, block_exits) =
                            self.lower_stmts(&stmt.children, std::mem::take(&mut pending))?;
                        entry = entry.or(block_entry);
                        pending = block_exits;
                        continue;
                    }
                    if !stmt.is_named {
                        continue;
                    }
                    self.append_stmt(stmt, &mut current, &mut pending, &mut entry)?;
                }
            }
        }
        Ok((entry, pending))
    }

    /// Add a statement to the current straight-line block, opening one if
    /// the previous statement ended a block.
    fn append_stmt(
        &mut self,
        stmt: &'a SyntaxNode,
        current: &mut Option<usize>,
        pending: &mut Pending,
        entry: &mut Option<usize>,
    ) -> Result<usize> {
        let idx = match *current {
            Some(idx) => idx,
            None => {
                let idx = self.new_block(BlockKind::Statement, stmt.span)?;
                self.connect(std::mem::take(pending), idx);
                *pending = vec![(idx, CfgEdgeKind::Unconditional)];
                *current = Some(idx);
                entry.get_or_insert(idx);
                idx
            }
        };
        self.blocks[idx].statement_spans.push(stmt.span);
        let end = stmt.span;
        self.blocks[idx].span.end_byte = end.end_byte.max(self.blocks[idx].span.end_byte);
        self.blocks[idx].span.end_line = end.end_line.max(self.blocks[idx].span.end_line);
        self.block_stmts[idx].push(stmt);
        Ok(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::infrastructure::ParserRegistry;
    use crate::features::parsing::domain::ParsedTree;

    fn parse(source: &str) -> ParsedTree {
        ParserRegistry::with_default_plugins()
            .parse("test.py", source.as_bytes())
            .unwrap()
    }

    fn function_body<'a>(tree: &'a ParsedTree) -> &'a SyntaxNode {
        let func = tree
            .root
            .children
            .iter()
            .find(|c| c.kind == SyntaxKind::FunctionDef)
            .unwrap();
        func.child_by_field("body").unwrap()
    }

    #[test]
    fn test_straight_line_function() {
        let tree = parse("def f():\n    a = 1\n    b = 2\n    return b\n");
        let lowered = CfgBuilder::new("fn1", &tree.source, None)
            .build(function_body(&tree))
            .unwrap();

        let cfg = &lowered.cfg;
        // Entry, one statement block, exit
        assert_eq!(cfg.blocks.len(), 3);
        assert_eq!(cfg.blocks[cfg.entry_idx].kind, BlockKind::Entry);
        assert_eq!(cfg.blocks[cfg.exit_idx].kind, BlockKind::Exit);
        let stmt_block = cfg
            .blocks
            .iter()
            .find(|b| b.kind == BlockKind::Statement)
            .unwrap();
        assert_eq!(stmt_block.statement_spans.len(), 3);
    }

    #[test]
    fn test_branch_produces_true_false_edges() {
        let tree = parse("def f(x):\n    if x:\n        a = 1\n    else:\n        a = 2\n    return a\n");
        let lowered = CfgBuilder::new("fn1", &tree.source, None)
            .build(function_body(&tree))
            .unwrap();

        let cfg = &lowered.cfg;
        let cond = cfg
            .blocks
            .iter()
            .find(|b| b.kind == BlockKind::Condition)
            .unwrap();
        assert!(cond.condition_text.as_deref() == Some("x"));

        let out: Vec<_> = cfg
            .edges
            .iter()
            .filter(|e| e.source_idx == cond.idx)
            .collect();
        assert!(out.iter().any(|e| e.kind == CfgEdgeKind::True));
        assert!(out.iter().any(|e| e.kind == CfgEdgeKind::False));
    }

    #[test]
    fn test_loop_has_back_edge() {
        let tree = parse("def f(n):\n    while n:\n        n = n - 1\n    return n\n");
        let lowered = CfgBuilder::new("fn1", &tree.source, None)
            .build(function_body(&tree))
            .unwrap();

        let cfg = &lowered.cfg;
        let header = cfg
            .blocks
            .iter()
            .find(|b| b.kind == BlockKind::LoopHeader)
            .unwrap();
        // Back edge into the header from the body
        assert!(cfg
            .edges
            .iter()
            .any(|e| e.target_idx == header.idx && e.source_idx != cfg.entry_idx));
    }

    #[test]
    fn test_try_produces_exception_edge() {
        let tree = parse(
            "def f():\n    try:\n        g()\n    except ValueError:\n        h()\n",
        );
        let lowered = CfgBuilder::new("fn1", &tree.source, None)
            .build(function_body(&tree))
            .unwrap();

        assert!(lowered
            .cfg
            .edges
            .iter()
            .any(|e| e.kind == CfgEdgeKind::Exception));
    }

    #[test]
    fn test_block_limit_enforced() {
        let mut source = String::from("def f(x):\n");
        for i in 0..50 {
            source.push_str(&format!("    if x > {}:\n        x = {}\n", i, i));
        }
        let tree = parse(&source);
        let result = CfgBuilder::new("fn1", &tree.source, Some(10)).build(function_body(&tree));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_body_entry_to_exit() {
        let tree = parse("def f():\n    pass\n");
        let lowered = CfgBuilder::new("fn1", &tree.source, None)
            .build(function_body(&tree))
            .unwrap();
        // pass is a statement; entry → stmt → exit all connected
        let cfg = &lowered.cfg;
        assert!(cfg.edges.iter().any(|e| e.source_idx == cfg.entry_idx));
        assert!(cfg.edges.iter().any(|e| e.target_idx == cfg.exit_idx));
    }
}
