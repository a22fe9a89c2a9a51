//! Per-function semantic IR attachment
//!
//! Finds each function-like IR node's syntax subtree by span, lowers it to
//! a CFG, layers the DFG on top, and attaches both to the document. A
//! failing function drops only its semantic layer; the structural IR is
//! kept and the failure is recorded as a diagnostic.

use tracing::warn;

use crate::config::IndexMode;
use crate::features::data_flow::infrastructure::DfgBuilder;
use crate::features::flow_graph::infrastructure::CfgBuilder;
use crate::features::ir_generation::domain::{FunctionSemanticIr, IRDocument, IrDiagnostic};
use crate::features::parsing::domain::{ParsedTree, SyntaxNode};
use crate::features::parsing::ports::LanguagePlugin;
use crate::shared::models::NodeKind;

/// Builds and attaches CFG/DFG per function
pub struct SemanticIrBuilder {
    mode: IndexMode,
}

impl SemanticIrBuilder {
    pub fn new(mode: IndexMode) -> Self {
        Self { mode }
    }

    pub fn attach(&self, tree: &ParsedTree, plugin: &dyn LanguagePlugin, doc: &mut IRDocument) {
        if !self.mode.semantic_ir_enabled() {
            return;
        }
        let block_limit = self.mode.semantic_ir_block_limit();

        // Function IR nodes indexed by byte span
        let functions: Vec<(String, String, u32, u32)> = doc
            .nodes
            .iter()
            .filter(|n| {
                matches!(n.kind, NodeKind::Function | NodeKind::Method)
            })
            .map(|n| {
                (
                    n.id.clone(),
                    n.fqn.clone().unwrap_or_default(),
                    n.span.start_byte,
                    n.span.end_byte,
                )
            })
            .collect();

        for (node_id, fqn, start, end) in functions {
            let Some(def) = find_def_by_span(&tree.root, start, end) else {
                continue;
            };
            let Some(body) = def.child_by_field("body") else {
                continue;
            };

            let lowered = match CfgBuilder::new(node_id.clone(), &tree.source, block_limit)
                .build(body)
            {
                Ok(lowered) => lowered,
                Err(err) => {
                    warn!(function = %fqn, error = %err, "semantic IR dropped");
                    doc.diagnostics.push(IrDiagnostic {
                        message: format!("Semantic IR dropped for {}: {}", fqn, err),
                        span: None,
                    });
                    continue;
                }
            };

            let params: Vec<String> = plugin
                .parameters(def, &tree.source)
                .into_iter()
                .map(|p| p.name)
                .collect();
            let dfg = DfgBuilder::new(&doc.repo_id, &doc.file_path, &fqn, &tree.source)
                .build(&lowered, &params);

            doc.semantics.insert(
                node_id,
                FunctionSemanticIr {
                    cfg: lowered.cfg,
                    dfg: if dfg.validate() { Some(dfg) } else { None },
                },
            );
        }
    }
}

/// Locate the definition node covering exactly the given byte span
fn find_def_by_span(node: &SyntaxNode, start: u32, end: u32) -> Option<&SyntaxNode> {
    if node.span.start_byte == start && node.span.end_byte == end && node.kind.is_definition() {
        return Some(node);
    }
    if node.span.start_byte <= start && end <= node.span.end_byte {
        for child in &node.children {
            if let Some(found) = find_def_by_span(child, start, end) {
                return Some(found);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::ir_generation::IrGenerator;
    use crate::features::parsing::infrastructure::ParserRegistry;

    fn build_doc(source: &str, mode: IndexMode) -> IRDocument {
        let registry = ParserRegistry::with_default_plugins();
        let tree = registry.parse("m.py", source.as_bytes()).unwrap();
        let plugin = registry.plugin_for_path("m.py").unwrap();
        let mut doc = IrGenerator::new("repo", "snap1").generate(&tree, plugin.as_ref());
        SemanticIrBuilder::new(mode).attach(&tree, plugin.as_ref(), &mut doc);
        doc
    }

    #[test]
    fn test_semantic_ir_attached_per_function() {
        let doc = build_doc(
            "def f(x):\n    if x:\n        return 1\n    return 2\n\ndef g():\n    pass\n",
            IndexMode::Balanced,
        );
        assert_eq!(doc.semantics.len(), 2);
        let f = doc
            .function_nodes()
            .find(|n| n.name.as_deref() == Some("f"))
            .unwrap();
        let semantic = doc.semantics.get(&f.id).unwrap();
        assert!(semantic.cfg.blocks.len() >= 4);
        assert!(semantic.dfg.is_some());
    }

    #[test]
    fn test_fast_mode_skips_semantic_ir() {
        let doc = build_doc("def f():\n    pass\n", IndexMode::Fast);
        assert!(doc.semantics.is_empty());
    }

    #[test]
    fn test_method_gets_semantic_ir() {
        let doc = build_doc(
            "class C:\n    def m(self, x):\n        y = x\n        return y\n",
            IndexMode::Deep,
        );
        assert_eq!(doc.semantics.len(), 1);
        let (_, semantic) = doc.semantics.iter().next().unwrap();
        let dfg = semantic.dfg.as_ref().unwrap();
        assert!(dfg.variables.iter().any(|v| v.name == "y"));
        // Parameters are entry-block writes
        assert!(dfg.variables.iter().any(|v| v.name == "x"));
    }
}
