//! IR Generator - deterministic walk from syntax tree to IRDocument
//!
//! Depth-first, single pass, carrying the builder's scope stack. Walk
//! order and tie-breaking are fixed: two machines indexing the same bytes
//! emit identical node and edge sequences.
//!
//! Single-declaration failures (a definition without a resolvable name,
//! an import the plugin cannot parse) are recorded as diagnostics on the
//! file and the walk continues; a file with zero parseable declarations
//! still yields its File node.

use std::collections::HashMap;

use tracing::debug;

use crate::features::ir_generation::domain::{ControlFlowSummary, IRDocument, IrDiagnostic};
use crate::features::parsing::domain::{ParsedTree, SyntaxKind, SyntaxNode};
use crate::features::parsing::ports::LanguagePlugin;
use crate::shared::models::{EdgeKind, NodeId, NodeKind};

use super::ir_builder::IrBuilder;

/// Per-file IR generator
pub struct IrGenerator {
    repo_id: String,
    snapshot_id: String,
}

impl IrGenerator {
    pub fn new(repo_id: impl Into<String>, snapshot_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            snapshot_id: snapshot_id.into(),
        }
    }

    pub fn generate(&self, tree: &ParsedTree, plugin: &dyn LanguagePlugin) -> IRDocument {
        let module_path = plugin
            .module_path(&tree.file_path, &tree.root, &tree.source)
            .unwrap_or_default();
        let is_test = plugin.is_test_file(&tree.file_path);

        let mut walker = Walker {
            builder: IrBuilder::new(
                &self.repo_id,
                &tree.file_path,
                &tree.language,
                module_path,
                is_test,
            ),
            plugin,
            source: &tree.source,
            summaries: HashMap::new(),
            summary_stack: Vec::new(),
            diagnostics: Vec::new(),
            entry_point_hint: false,
        };

        walker.builder.create_file_node(tree.root.span, &tree.source);
        for diag in &tree.diagnostics {
            walker.diagnostics.push(IrDiagnostic {
                message: diag.message.clone(),
                span: Some(diag.span),
            });
        }
        walker.walk_body(&tree.root);

        let mut doc = IRDocument::new(
            &self.repo_id,
            &self.snapshot_id,
            &tree.file_path,
            &tree.language,
        );
        let (nodes, edges, types, signatures) = walker.builder.build();
        debug!(
            file = %tree.file_path,
            nodes = nodes.len(),
            edges = edges.len(),
            "IR generated"
        );
        doc.nodes = nodes;
        doc.edges = edges;
        doc.type_entities = types;
        doc.signature_entities = signatures;
        doc.summaries = walker.summaries;
        doc.diagnostics = walker.diagnostics;
        doc.entry_point_hint = walker.entry_point_hint;
        doc
    }
}

struct Walker<'a> {
    builder: IrBuilder,
    plugin: &'a dyn LanguagePlugin,
    source: &'a str,
    summaries: HashMap<NodeId, ControlFlowSummary>,
    /// One summary per open function scope
    summary_stack: Vec<(NodeId, ControlFlowSummary)>,
    diagnostics: Vec<IrDiagnostic>,
    entry_point_hint: bool,
}

impl<'a> Walker<'a> {
    // ── statement / declaration walk ────────────────────────────────────

    fn walk_body(&mut self, node: &SyntaxNode) {
        for child in &node.children {
            self.walk_stmt(child);
        }
    }

    fn walk_stmt(&mut self, node: &SyntaxNode) {
        match &node.kind {
            SyntaxKind::ClassDef | SyntaxKind::InterfaceDef | SyntaxKind::EnumDef => {
                self.walk_class(node);
            }
            SyntaxKind::FunctionDef | SyntaxKind::MethodDef => {
                self.walk_function(node);
            }
            SyntaxKind::LambdaDef => {
                self.walk_lambda(node);
            }
            SyntaxKind::ImportDecl => {
                let infos = self.plugin.imports(node, self.source);
                if infos.is_empty() {
                    self.diagnostics.push(IrDiagnostic {
                        message: format!("Unparsed import: {}", node.text(self.source)),
                        span: Some(node.span),
                    });
                }
                for info in infos {
                    self.builder.create_import_node(&info, node.text(self.source));
                }
            }
            SyntaxKind::AssignmentStmt => self.walk_assignment(node, false),
            SyntaxKind::AugAssignmentStmt => self.walk_assignment(node, true),
            SyntaxKind::FieldDecl => self.walk_field(node),
            SyntaxKind::IfStmt => {
                let condition = self.condition_text(node);
                if !self.builder.in_function_scope()
                    && condition.as_deref().is_some_and(|c| c.contains("__name__"))
                {
                    self.entry_point_hint = true;
                }
                self.record_branch(condition);
                self.builder
                    .create_control_node(NodeKind::Conditional, node.span, node.text(self.source));
                if let Some(cond) = node.child_by_field("condition") {
                    self.walk_expr(cond);
                }
                self.walk_body(node);
            }
            SyntaxKind::ForStmt | SyntaxKind::WhileStmt => {
                let condition = self.condition_text(node);
                self.record_branch(condition);
                if let Some((_, summary)) = self.summary_stack.last_mut() {
                    summary.has_loop = true;
                }
                self.builder
                    .create_control_node(NodeKind::Loop, node.span, node.text(self.source));
                if let Some(cond) = node.child_by_field("condition") {
                    self.walk_expr(cond);
                }
                self.walk_body(node);
            }
            SyntaxKind::TryStmt => {
                if let Some((_, summary)) = self.summary_stack.last_mut() {
                    summary.has_try = true;
                }
                self.builder
                    .create_control_node(NodeKind::TryCatch, node.span, node.text(self.source));
                self.walk_body(node);
            }
            SyntaxKind::RaiseStmt => {
                if let Some(name) = self.thrown_name(node) {
                    self.builder
                        .add_reference_edge(EdgeKind::Throws, &name, node.span);
                }
                self.walk_body(node);
            }
            SyntaxKind::ReturnStmt | SyntaxKind::YieldExpr => {
                for child in &node.children {
                    self.walk_expr(child);
                }
            }
            SyntaxKind::CallExpr => {
                self.walk_call(node);
            }
            SyntaxKind::Comment | SyntaxKind::Error => {}
            // decorated_definition wrappers, blocks, expression statements
            _ => {
                if node.raw_kind == "decorated_definition" {
                    self.walk_decorated(node);
                } else if node.raw_kind == "expression_statement" {
                    // The wrapped expression may itself be an assignment or
                    // call; re-dispatch as a statement
                    for child in &node.children {
                        if child.is_named {
                            self.walk_stmt(child);
                        }
                    }
                } else if contains_expression_site(&node.raw_kind) {
                    for child in &node.children {
                        self.walk_expr(child);
                    }
                } else {
                    self.walk_body(node);
                }
            }
        }
    }

    fn walk_class(&mut self, node: &SyntaxNode) {
        let Some(name) = self.plugin.definition_name(node, self.source) else {
            self.diagnostics.push(IrDiagnostic {
                message: format!("{} without a name", node.raw_kind),
                span: Some(node.span),
            });
            self.walk_body(node);
            return;
        };
        let kind = match node.kind {
            SyntaxKind::InterfaceDef => NodeKind::Interface,
            SyntaxKind::EnumDef => NodeKind::Enum,
            _ => NodeKind::Class,
        };
        let name = name.to_string();
        let body_span = node.child_by_field("body").map(|b| b.span);
        let docstring = self.plugin.docstring(node, self.source);
        let heritage = self.plugin.heritage(node, self.source);

        self.builder.create_class_node(
            kind,
            &name,
            node.span,
            body_span,
            docstring,
            node.text(self.source),
        );

        // INHERITS/IMPLEMENTS originate from the class node itself
        for base in heritage {
            let edge_kind = if base.is_interface {
                EdgeKind::Implements
            } else {
                EdgeKind::Inherits
            };
            self.builder.add_reference_edge(edge_kind, &base.name, base.span);
        }
        self.emit_decorators(node);

        if let Some(body) = node.child_by_field("body") {
            self.walk_body(body);
        } else {
            self.walk_body(node);
        }
        self.builder.finish_scope();
    }

    fn walk_function(&mut self, node: &SyntaxNode) {
        let Some(name) = self.plugin.definition_name(node, self.source) else {
            self.diagnostics.push(IrDiagnostic {
                message: format!("{} without a name", node.raw_kind),
                span: Some(node.span),
            });
            return;
        };
        let name = name.to_string();
        let params = self.plugin.parameters(node, self.source);
        let return_type = self.plugin.return_type(node, self.source);
        let throws = self.plugin.throws_clause(node, self.source);
        let body_span = node.child_by_field("body").map(|b| b.span);
        let docstring = self.plugin.docstring(node, self.source);

        let id = self.builder.create_function_node(
            &name,
            node.span,
            body_span,
            docstring,
            &params,
            return_type.as_deref(),
            self.plugin.visibility(node, self.source),
            self.plugin.is_async(node, self.source),
            self.plugin.is_static(node, self.source),
            &throws,
            node.text(self.source),
        );

        // Annotation type names are REFERENCES sites
        for param in &params {
            if let Some(annotation) = &param.type_annotation {
                let base = generic_base(annotation);
                self.builder
                    .add_reference_edge(EdgeKind::References, &base, param.span);
            }
        }
        if let Some(ret) = &return_type {
            self.builder
                .add_reference_edge(EdgeKind::References, &generic_base(ret), node.span);
        }
        for thrown in &throws {
            self.builder
                .add_reference_edge(EdgeKind::Throws, &generic_base(thrown), node.span);
        }
        self.emit_decorators(node);

        self.summary_stack.push((id.clone(), ControlFlowSummary::new()));
        if let Some(body) = node.child_by_field("body") {
            self.walk_body(body);
        }
        if let Some((node_id, summary)) = self.summary_stack.pop() {
            self.summaries.insert(node_id, summary);
        }
        self.builder.finish_scope();
    }

    fn walk_lambda(&mut self, node: &SyntaxNode) {
        let id = self.builder.create_lambda_node(node.span, node.text(self.source));
        self.summary_stack.push((id, ControlFlowSummary::new()));
        if let Some(body) = node.child_by_field("body") {
            self.walk_expr(body);
        } else {
            self.walk_body(node);
        }
        if let Some((node_id, summary)) = self.summary_stack.pop() {
            self.summaries.insert(node_id, summary);
        }
        self.builder.finish_scope();
    }

    /// decorated_definition: decorators first, then the wrapped definition
    fn walk_decorated(&mut self, node: &SyntaxNode) {
        let decorators: Vec<(String, crate::shared::models::Span)> = node
            .children
            .iter()
            .filter(|c| c.kind == SyntaxKind::Decorator)
            .map(|d| (decorator_name(d, self.source), d.span))
            .collect();

        for child in &node.children {
            if child.kind == SyntaxKind::Decorator {
                continue;
            }
            let before = self.builder.nodes().len();
            self.walk_stmt(child);
            // Attach DECORATES to the definition node the child produced
            if self.builder.nodes().len() > before {
                let target_id = self.builder.nodes()[before].id.clone();
                for (name, span) in &decorators {
                    let edge = match self.builder.resolve_name(name) {
                        super::ir_builder::ResolvedRef::Local(t) => {
                            crate::shared::models::Edge::resolved(
                                EdgeKind::Decorates,
                                target_id.clone(),
                                t,
                                *span,
                            )
                        }
                        super::ir_builder::ResolvedRef::Imported(fqn) => {
                            crate::shared::models::Edge::unresolved(
                                EdgeKind::Decorates,
                                target_id.clone(),
                                fqn,
                                *span,
                            )
                        }
                        super::ir_builder::ResolvedRef::Unknown => {
                            crate::shared::models::Edge::unresolved(
                                EdgeKind::Decorates,
                                target_id.clone(),
                                name.clone(),
                                *span,
                            )
                        }
                    };
                    self.builder.push_edge(edge);
                }
            }
        }
    }

    /// Decorators nested directly under a definition (TS/Java annotations)
    fn emit_decorators(&mut self, def: &SyntaxNode) {
        let decorators: Vec<_> = def
            .children
            .iter()
            .filter(|c| c.kind == SyntaxKind::Decorator)
            .map(|d| (decorator_name(d, self.source), d.span))
            .collect();
        for (name, span) in decorators {
            self.builder
                .add_reference_edge(EdgeKind::Decorates, &name, span);
        }
    }

    fn walk_field(&mut self, node: &SyntaxNode) {
        // Field name: "name" field, declarator chain, or first identifier
        let name = node
            .child_by_field("name")
            .map(|n| n.text(self.source))
            .or_else(|| {
                node.child_by_field("declarator")
                    .and_then(|d| d.child_by_field("name"))
                    .map(|n| n.text(self.source))
            })
            .or_else(|| {
                node.children
                    .iter()
                    .find(|c| c.kind == SyntaxKind::NameExpr)
                    .map(|n| n.text(self.source))
            });
        let Some(name) = name else {
            self.walk_body(node);
            return;
        };
        let type_annotation = node
            .child_by_field("type")
            .map(|t| t.text(self.source).to_string());
        self.builder.create_variable_node(
            &name.to_string(),
            node.span,
            type_annotation.as_deref(),
            node.text(self.source),
        );
    }

    fn walk_assignment(&mut self, node: &SyntaxNode, augmented: bool) {
        // TS/Java wrap declarators; unwrap to (lhs, rhs, type)
        let declarators: Vec<&SyntaxNode> = node
            .children
            .iter()
            .filter(|c| c.raw_kind == "variable_declarator")
            .collect();
        if !declarators.is_empty() {
            for decl in declarators {
                self.walk_single_assignment(
                    decl.child_by_field("name"),
                    decl.child_by_field("value"),
                    decl.child_by_field("type"),
                    decl,
                    augmented,
                );
            }
            return;
        }
        self.walk_single_assignment(
            node.child_by_field("left"),
            node.child_by_field("right")
                .or_else(|| node.child_by_field("value")),
            node.child_by_field("type"),
            node,
            augmented,
        );
    }

    fn walk_single_assignment(
        &mut self,
        lhs: Option<&SyntaxNode>,
        rhs: Option<&SyntaxNode>,
        type_node: Option<&SyntaxNode>,
        whole: &SyntaxNode,
        augmented: bool,
    ) {
        if let Some(lhs) = lhs {
            let mut names = Vec::new();
            collect_target_names(lhs, self.source, &mut names);
            for (name, span) in names {
                if augmented {
                    self.builder.add_reference_edge(EdgeKind::Reads, &name, span);
                }
                // First write in this scope declares the variable
                if matches!(
                    self.builder.resolve_name(&name),
                    super::ir_builder::ResolvedRef::Unknown
                ) && !name.contains('.')
                {
                    self.builder.create_variable_node(
                        &name,
                        whole.span,
                        type_node.map(|t| t.text(self.source)).as_deref(),
                        whole.text(self.source),
                    );
                }
                self.builder.add_reference_edge(EdgeKind::Writes, &name, span);
            }
        }
        if let Some(rhs) = rhs {
            self.walk_expr(rhs);
        }
    }

    // ── expression walk ─────────────────────────────────────────────────

    fn walk_expr(&mut self, node: &SyntaxNode) {
        match &node.kind {
            SyntaxKind::NameExpr => {
                let name = node.text(self.source);
                if !name.is_empty() {
                    self.builder
                        .add_reference_edge(EdgeKind::Reads, name, node.span);
                }
            }
            SyntaxKind::AttributeExpr => {
                // Dotted reference reads its full path; resolution binds on
                // the head segment
                let name = node.text(self.source);
                if is_dotted_name(name) {
                    self.builder
                        .add_reference_edge(EdgeKind::Reads, name, node.span);
                } else {
                    for child in &node.children {
                        self.walk_expr(child);
                    }
                }
            }
            SyntaxKind::CallExpr => self.walk_call(node),
            SyntaxKind::LambdaDef => self.walk_lambda(node),
            SyntaxKind::IfStmt => {
                // Conditional expressions inside expressions count as branches
                self.record_branch(self.condition_text(node));
                for child in &node.children {
                    self.walk_expr(child);
                }
            }
            SyntaxKind::LiteralExpr | SyntaxKind::Comment | SyntaxKind::Error => {}
            _ => {
                for child in &node.children {
                    self.walk_expr(child);
                }
            }
        }
    }

    fn walk_call(&mut self, node: &SyntaxNode) {
        let callee = node
            .child_by_field("function")
            .or_else(|| node.child_by_field("name"));
        let args = node.child_by_field("arguments");
        let arg_count = args
            .map(|a| a.children.iter().filter(|c| c.is_named).count() as u32)
            .unwrap_or(0);

        if let Some(callee) = callee {
            let name = callee.text(self.source);
            if is_dotted_name(name) {
                self.builder.add_call_edge(name, arg_count, node.span);
            } else {
                // Computed callee: no CALLS edge, but its reads still count
                self.walk_expr(callee);
            }
        }
        if let Some(args) = args {
            for arg in &args.children {
                self.walk_expr(arg);
            }
        }
    }

    // ── helpers ─────────────────────────────────────────────────────────

    fn record_branch(&mut self, condition: Option<String>) {
        if let Some((_, summary)) = self.summary_stack.last_mut() {
            summary.record_branch(condition);
        }
    }

    fn condition_text(&self, node: &SyntaxNode) -> Option<String> {
        node.child_by_field("condition")
            .map(|c| c.text(self.source).to_string())
    }

    /// `raise ValueError(...)` / `throw new FooError(...)` → "ValueError"
    fn thrown_name(&self, node: &SyntaxNode) -> Option<String> {
        let mut found = None;
        node.walk(&mut |n| {
            if found.is_some() {
                return;
            }
            if n.kind == SyntaxKind::CallExpr {
                if let Some(callee) = n.child_by_field("function").or_else(|| n.child_by_field("name")) {
                    found = Some(callee.text(self.source).to_string());
                }
            } else if n.kind == SyntaxKind::NameExpr && n.raw_kind == "identifier" {
                found = Some(n.text(self.source).to_string());
            }
        });
        found.filter(|n| is_dotted_name(n))
    }
}

/// Raw kinds whose children are expressions, not statements
fn contains_expression_site(raw_kind: &str) -> bool {
    matches!(
        raw_kind,
        "parenthesized_expression" | "argument_list" | "binary_operator"
    )
}

/// Identifier or dotted identifier path
fn is_dotted_name(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '.')
}

/// "List[int]" → "List"; "Map<K,V>" → "Map"
fn generic_base(annotation: &str) -> String {
    annotation
        .split(['[', '<', '?'])
        .next()
        .unwrap_or(annotation)
        .trim()
        .to_string()
}

/// "@app.route('/x')" → "app.route"
fn decorator_name(node: &SyntaxNode, source: &str) -> String {
    let text = node.text(source).trim_start_matches('@');
    text.split(['(', ' ']).next().unwrap_or(text).to_string()
}

/// Collect assignment target identifiers (handles tuple targets)
fn collect_target_names(node: &SyntaxNode, source: &str, out: &mut Vec<(String, crate::shared::models::Span)>) {
    match &node.kind {
        SyntaxKind::NameExpr => out.push((node.text(source).to_string(), node.span)),
        SyntaxKind::AttributeExpr => {
            let text = node.text(source);
            if is_dotted_name(text) {
                out.push((text.to_string(), node.span));
            }
        }
        _ => {
            for child in &node.children {
                collect_target_names(child, source, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::features::parsing::infrastructure::ParserRegistry;
    use crate::shared::models::EdgeKind;

    fn generate(file: &str, source: &str) -> IRDocument {
        let registry = ParserRegistry::with_default_plugins();
        let tree = registry.parse(file, source.as_bytes()).unwrap();
        let plugin = registry.plugin_for_path(file).unwrap();
        IrGenerator::new("test-repo", "snap1").generate(&tree, plugin.as_ref())
    }

    #[test]
    fn test_python_class_with_method() {
        let doc = generate(
            "mypkg/calc.py",
            "class Calculator:\n    def add(self, x: int, y: int) -> int:\n        return x + y\n",
        );

        let file = doc.file_node().unwrap();
        assert_eq!(file.fqn.as_deref(), Some("mypkg.calc"));

        let class = doc.nodes_of_kind(NodeKind::Class).next().unwrap();
        assert_eq!(class.fqn.as_deref(), Some("mypkg.calc.Calculator"));

        let method = doc.nodes_of_kind(NodeKind::Method).next().unwrap();
        assert_eq!(method.fqn.as_deref(), Some("mypkg.calc.Calculator.add"));

        let params: Vec<_> = doc.nodes_of_kind(NodeKind::Parameter).collect();
        assert_eq!(params.len(), 3); // self, x, y

        // CONTAINS: File→Class, Class→Method, Method→params
        assert!(doc.validate_contains_forest().is_ok());

        // READS of x and y resolve to the parameter nodes
        let reads: Vec<_> = doc
            .edges_of_kind(EdgeKind::Reads)
            .filter(|e| e.source_id == method.id)
            .collect();
        assert_eq!(reads.len(), 2);
        assert!(reads.iter().all(|e| e.is_resolved()));

        // Signature entity
        let sig = doc
            .signature_entities
            .iter()
            .find(|s| s.owner_node_id == method.id)
            .unwrap();
        assert_eq!(sig.raw, "add(self, x: int, y: int) -> int");
        assert_eq!(sig.parameter_type_ids.len(), 2);
        assert!(sig.return_type_id.is_some());
    }

    #[test]
    fn test_java_inner_class_fqns() {
        let doc = generate(
            "src/main/java/com/example/Outer.java",
            "package com.example; class Outer { class Inner { int value; } }",
        );

        let fqns: Vec<_> = doc.nodes.iter().filter_map(|n| n.fqn.clone()).collect();
        assert!(fqns.contains(&"com.example.Outer".to_string()));
        assert!(fqns.contains(&"com.example.Outer.Inner".to_string()));
        assert!(fqns.contains(&"com.example.Outer.Inner.value".to_string()));
        assert!(!fqns.contains(&"com.example.Outer.Outer".to_string()));
    }

    #[test]
    fn test_python_import_and_unresolved_call() {
        let doc = generate("b.py", "from a import foo\n\nfoo()\n");

        let import = doc.nodes_of_kind(NodeKind::Import).next().unwrap();
        assert_eq!(import.fqn.as_deref(), Some("a.foo"));

        // The call is known to come from module a, kept unresolved with the
        // imported FQN for the graph builder
        let call = doc.edges_of_kind(EdgeKind::Calls).next().unwrap();
        assert!(call.target_id.is_none());
        assert_eq!(call.attrs.unresolved_name.as_deref(), Some("a.foo"));
    }

    #[test]
    fn test_local_call_resolves_in_file() {
        let doc = generate(
            "m.py",
            "def helper():\n    pass\n\ndef main():\n    helper()\n",
        );

        let helper = doc
            .function_nodes()
            .find(|n| n.name.as_deref() == Some("helper"))
            .unwrap();
        let call = doc.edges_of_kind(EdgeKind::Calls).next().unwrap();
        assert_eq!(call.target_id.as_deref(), Some(helper.id.as_str()));
    }

    #[test]
    fn test_inheritance_edge() {
        let doc = generate(
            "m.py",
            "class Base:\n    pass\n\nclass Child(Base):\n    pass\n",
        );

        let base = doc
            .nodes_of_kind(NodeKind::Class)
            .find(|n| n.name.as_deref() == Some("Base"))
            .unwrap();
        let inherits = doc.edges_of_kind(EdgeKind::Inherits).next().unwrap();
        assert_eq!(inherits.target_id.as_deref(), Some(base.id.as_str()));
    }

    #[test]
    fn test_control_flow_summary() {
        let doc = generate(
            "m.py",
            "def f(x):\n    if x > 0:\n        for i in range(x):\n            print(i)\n    try:\n        g()\n    except Exception:\n        pass\n",
        );

        let func = doc.function_nodes().next().unwrap();
        let summary = doc.summaries.get(&func.id).unwrap();
        assert!(summary.cyclomatic_complexity >= 3); // if + for + 1
        assert!(summary.has_loop);
        assert!(summary.has_try);
        assert!(!summary.branch_conditions.is_empty());
    }

    #[test]
    fn test_throws_edge() {
        let doc = generate("m.py", "def f():\n    raise ValueError(\"bad\")\n");
        let throws = doc.edges_of_kind(EdgeKind::Throws).next().unwrap();
        assert_eq!(throws.attrs.unresolved_name.as_deref(), Some("ValueError"));
    }

    #[test]
    fn test_module_level_variable() {
        let doc = generate("m.py", "VERSION = \"1.0\"\n");
        let var = doc.nodes_of_kind(NodeKind::Variable).next().unwrap();
        assert_eq!(var.name.as_deref(), Some("VERSION"));
        assert_eq!(var.fqn.as_deref(), Some("m.VERSION"));
        assert!(doc
            .edges_of_kind(EdgeKind::Writes)
            .any(|e| e.target_id.as_deref() == Some(var.id.as_str())));
    }

    #[test]
    fn test_determinism_same_input_same_ids() {
        let source = "class A:\n    def m(self):\n        return 1\n";
        let doc1 = generate("m.py", source);
        let doc2 = generate("m.py", source);

        let ids1: Vec<_> = doc1.nodes.iter().map(|n| n.id.clone()).collect();
        let ids2: Vec<_> = doc2.nodes.iter().map(|n| n.id.clone()).collect();
        assert_eq!(ids1, ids2);

        let edge_ids1: Vec<_> = doc1.edges.iter().map(|e| e.id.clone()).collect();
        let edge_ids2: Vec<_> = doc2.edges.iter().map(|e| e.id.clone()).collect();
        assert_eq!(edge_ids1, edge_ids2);
    }

    #[test]
    fn test_broken_file_still_yields_file_node() {
        let doc = generate("broken.py", "def broken(:\n");
        assert!(doc.file_node().is_some());
        assert!(!doc.diagnostics.is_empty());
    }

    #[test]
    fn test_decorated_function() {
        let doc = generate(
            "m.py",
            "@app.route('/x')\ndef handler():\n    pass\n",
        );
        let dec = doc.edges_of_kind(EdgeKind::Decorates).next().unwrap();
        assert_eq!(dec.attrs.unresolved_name.as_deref(), Some("app.route"));
    }
}
