//! IR Builder - stateful emitter for one file's IR
//!
//! Responsibilities:
//! - Stable node ids from (repo_id, file_path, kind, fqn, span, content_hash)
//! - FQN construction from the scope stack (module → class → function)
//! - CONTAINS edges mirroring `parent_id`
//! - Name resolution against the scope chain and imports; unresolved
//!   references become edges with `target_id = None`
//! - Signature and type entity emission

use std::collections::HashMap;

use crate::features::parsing::ports::{ImportInfo, ParamInfo};
use crate::shared::models::{
    signature_hash, Edge, EdgeKind, Node, NodeKind, SignatureEntity, Span, TypeEntity, Visibility,
};
use crate::shared::utils::hash::content_hash;

use super::type_resolver::TypeResolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Class,
    Function,
}

/// Scope frame carrying the local symbol table
#[derive(Debug)]
struct ScopeFrame {
    kind: ScopeKind,
    name: String,
    node_id: Option<String>,
    /// Locally declared names → node ids
    symbols: HashMap<String, String>,
}

/// Outcome of resolving a name against the current scope
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedRef {
    /// Bound to a node in this file
    Local(String),
    /// Known to come from an import; carries the imported FQN
    Imported(String),
    /// Nothing visible; bare name kept for cross-file linkage
    Unknown,
}

/// Stateful IR builder for a single file
pub struct IrBuilder {
    repo_id: String,
    file_path: String,
    language: String,
    is_test_file: bool,

    scope_stack: Vec<ScopeFrame>,
    /// Visible import bindings: local name → imported FQN
    imports: HashMap<String, String>,

    type_resolver: TypeResolver,

    nodes: Vec<Node>,
    edges: Vec<Edge>,
    signatures: Vec<SignatureEntity>,
}

impl IrBuilder {
    pub fn new(
        repo_id: impl Into<String>,
        file_path: impl Into<String>,
        language: impl Into<String>,
        module_path: impl Into<String>,
        is_test_file: bool,
    ) -> Self {
        let repo_id = repo_id.into();
        let type_resolver = TypeResolver::new(repo_id.clone());
        let mut builder = Self {
            repo_id,
            file_path: file_path.into(),
            language: language.into(),
            is_test_file,
            scope_stack: Vec::new(),
            imports: HashMap::new(),
            type_resolver,
            nodes: Vec::new(),
            edges: Vec::new(),
            signatures: Vec::new(),
        };
        builder.push_scope(ScopeKind::Module, module_path.into());
        builder
    }

    // ── scope management ────────────────────────────────────────────────

    fn push_scope(&mut self, kind: ScopeKind, name: String) {
        self.scope_stack.push(ScopeFrame {
            kind,
            name,
            node_id: None,
            symbols: HashMap::new(),
        });
    }

    pub fn finish_scope(&mut self) {
        // The module frame stays for the whole file
        if self.scope_stack.len() > 1 {
            self.scope_stack.pop();
        }
    }

    fn set_current_scope_node_id(&mut self, node_id: String) {
        if let Some(frame) = self.scope_stack.last_mut() {
            frame.node_id = Some(node_id);
        }
    }

    fn current_parent_id(&self) -> Option<String> {
        self.scope_stack
            .iter()
            .rev()
            .find_map(|frame| frame.node_id.clone())
    }

    pub fn in_class_scope(&self) -> bool {
        self.scope_stack
            .last()
            .is_some_and(|f| f.kind == ScopeKind::Class)
    }

    pub fn in_function_scope(&self) -> bool {
        self.scope_stack
            .iter()
            .any(|f| f.kind == ScopeKind::Function)
    }

    pub fn module_path(&self) -> String {
        self.scope_stack
            .first()
            .map(|f| f.name.clone())
            .unwrap_or_default()
    }

    /// FQN of the innermost named scope (for lambda parents)
    pub fn current_scope_fqn(&self) -> String {
        self.scope_stack
            .iter()
            .map(|f| f.name.as_str())
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Scope chain joined with the new name: `module.Class.method.name`
    fn build_fqn(&self, name: &str) -> String {
        let mut parts: Vec<&str> = self
            .scope_stack
            .iter()
            .map(|f| f.name.as_str())
            .filter(|n| !n.is_empty())
            .collect();
        parts.push(name);
        parts.join(".")
    }

    fn bind_symbol(&mut self, name: &str, node_id: &str) {
        if let Some(frame) = self.scope_stack.last_mut() {
            frame.symbols.insert(name.to_string(), node_id.to_string());
        }
    }

    /// Scope chain → imports → unknown
    pub fn resolve_name(&self, name: &str) -> ResolvedRef {
        for frame in self.scope_stack.iter().rev() {
            if let Some(id) = frame.symbols.get(name) {
                return ResolvedRef::Local(id.clone());
            }
        }
        // Dotted references resolve on their head segment
        let head = name.split('.').next().unwrap_or(name);
        if let Some(fqn) = self.imports.get(name).or_else(|| self.imports.get(head)) {
            let suffix = name.strip_prefix(head).unwrap_or("");
            return ResolvedRef::Imported(format!("{}{}", fqn, suffix));
        }
        ResolvedRef::Unknown
    }

    // ── node creation ───────────────────────────────────────────────────

    fn make_node(
        &self,
        kind: NodeKind,
        fqn: Option<&str>,
        span: Span,
        source_text: &str,
    ) -> (Node, String) {
        let hash = content_hash(source_text);
        let id = Node::compute_id(&self.repo_id, &self.file_path, kind, fqn, &span, &hash);
        let mut node = Node::new(
            id.clone(),
            kind,
            self.file_path.clone(),
            span,
            self.language.clone(),
            hash,
        );
        node.is_test_file = self.is_test_file;
        if let Some(fqn) = fqn {
            node = node.with_fqn(fqn);
        }
        let module = self.module_path();
        if !module.is_empty() {
            node = node.with_module_path(module);
        }
        (node, id)
    }

    fn attach(&mut self, mut node: Node, span: Span) -> String {
        let parent_id = self.current_parent_id();
        node.parent_id = parent_id.clone();
        let id = node.id.clone();
        self.nodes.push(node);
        if let Some(parent) = parent_id {
            self.edges
                .push(Edge::resolved(EdgeKind::Contains, parent, id.clone(), span));
        }
        id
    }

    /// Root File node; must be the first node of the document
    pub fn create_file_node(&mut self, span: Span, source: &str) -> String {
        let module = self.module_path();
        let fqn = if module.is_empty() { None } else { Some(module.as_str()) };
        let (mut node, id) = self.make_node(NodeKind::File, fqn, span, source);
        let name = self
            .file_path
            .rsplit('/')
            .next()
            .unwrap_or(&self.file_path)
            .to_string();
        node.name = Some(name);
        self.nodes.push(node);
        self.set_current_scope_node_id(id.clone());
        id
    }

    pub fn create_class_node(
        &mut self,
        kind: NodeKind,
        name: &str,
        span: Span,
        body_span: Option<Span>,
        docstring: Option<String>,
        source_text: &str,
    ) -> String {
        let fqn = self.build_fqn(name);
        let (mut node, _) = self.make_node(kind, Some(&fqn), span, source_text);
        node.name = Some(name.to_string());
        node.body_span = body_span;
        node.docstring = docstring;
        let id = self.attach(node, span);

        self.bind_symbol(name, &id);
        self.type_resolver.register_local_type(name, &id);

        self.push_scope(ScopeKind::Class, name.to_string());
        self.set_current_scope_node_id(id.clone());
        id
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_function_node(
        &mut self,
        name: &str,
        span: Span,
        body_span: Option<Span>,
        docstring: Option<String>,
        params: &[ParamInfo],
        return_type: Option<&str>,
        visibility: Visibility,
        is_async: bool,
        is_static: bool,
        throws: &[String],
        source_text: &str,
    ) -> String {
        let kind = if self.in_class_scope() {
            NodeKind::Method
        } else {
            NodeKind::Function
        };
        let fqn = self.build_fqn(name);
        let (mut node, _) = self.make_node(kind, Some(&fqn), span, source_text);
        node.name = Some(name.to_string());
        node.body_span = body_span;
        node.docstring = docstring;
        let id = self.attach(node, span);

        self.bind_symbol(name, &id);
        self.push_scope(ScopeKind::Function, name.to_string());
        self.set_current_scope_node_id(id.clone());

        // Parameters live inside the function scope
        for param in params {
            self.create_parameter_node(param);
        }

        let signature = self.build_signature(
            &id, name, params, return_type, visibility, is_async, is_static, throws,
        );
        let signature_id = signature.id.clone();
        self.signatures.push(signature);
        if let Some(node) = self.nodes.iter_mut().find(|n| n.id == id) {
            node.signature_id = Some(signature_id);
        }
        id
    }

    /// Anonymous lambda: name None, fqn `parent.λ<line>:<col>`
    pub fn create_lambda_node(&mut self, span: Span, source_text: &str) -> String {
        let fqn = format!(
            "{}.λ{}:{}",
            self.current_scope_fqn(),
            span.start_line,
            span.start_col
        );
        let (node, _) = self.make_node(NodeKind::Lambda, Some(&fqn), span, source_text);
        let id = self.attach(node, span);
        self.push_scope(ScopeKind::Function, String::new());
        self.set_current_scope_node_id(id.clone());
        id
    }

    fn create_parameter_node(&mut self, param: &ParamInfo) {
        let fqn = self.build_fqn(&param.name);
        let (mut node, _) = self.make_node(NodeKind::Parameter, Some(&fqn), param.span, &param.name);
        node.name = Some(param.name.clone());
        if let Some(annotation) = &param.type_annotation {
            node.declared_type_id = self.type_resolver.resolve(annotation);
        }
        let id = self.attach(node, param.span);
        self.bind_symbol(&param.name, &id);
    }

    /// Variable (module/function scope) or Field (class scope)
    pub fn create_variable_node(
        &mut self,
        name: &str,
        span: Span,
        type_annotation: Option<&str>,
        source_text: &str,
    ) -> String {
        let kind = if self.in_class_scope() {
            NodeKind::Field
        } else {
            NodeKind::Variable
        };
        let fqn = self.build_fqn(name);
        let (mut node, _) = self.make_node(kind, Some(&fqn), span, source_text);
        node.name = Some(name.to_string());
        if let Some(annotation) = type_annotation {
            node.declared_type_id = self.type_resolver.resolve(annotation);
        }
        let id = self.attach(node, span);
        self.bind_symbol(name, &id);
        id
    }

    /// Conditional / Loop / TryCatch structural node (anonymous)
    pub fn create_control_node(&mut self, kind: NodeKind, span: Span, source_text: &str) -> String {
        let (node, _) = self.make_node(kind, None, span, source_text);
        self.attach(node, span)
    }

    /// Import node + IMPORTS edge per binding
    pub fn create_import_node(&mut self, info: &ImportInfo, source_text: &str) -> String {
        let fqn = info.imported_fqn();
        let (mut node, _) = self.make_node(NodeKind::Import, Some(&fqn), info.span, source_text);
        node.name = Some(info.local_name());
        let id = self.attach(node, info.span);

        self.imports.insert(info.local_name(), fqn.clone());

        let importer = self
            .current_parent_id()
            .unwrap_or_else(|| id.clone());
        let mut edge = Edge::unresolved(EdgeKind::Imports, importer, fqn, info.span);
        edge.attrs.alias = info.alias.clone();
        edge.attrs.is_from_import = Some(info.is_from_import);
        edge.attrs.imported_module = Some(info.module.clone());
        self.edges.push(edge);
        id
    }

    // ── reference edges ─────────────────────────────────────────────────

    /// Emit a reference edge from the current scope's node, resolving the
    /// name against scope chain → imports → unknown.
    pub fn add_reference_edge(&mut self, kind: EdgeKind, name: &str, span: Span) {
        let Some(source) = self.current_parent_id() else {
            return;
        };
        let edge = match self.resolve_name(name) {
            ResolvedRef::Local(target) => Edge::resolved(kind, source, target, span),
            ResolvedRef::Imported(fqn) => Edge::unresolved(kind, source, fqn, span),
            ResolvedRef::Unknown => Edge::unresolved(kind, source, name.to_string(), span),
        };
        self.edges.push(edge);
    }

    pub fn add_call_edge(&mut self, callee: &str, arg_count: u32, span: Span) {
        let Some(source) = self.current_parent_id() else {
            return;
        };
        let mut edge = match self.resolve_name(callee) {
            ResolvedRef::Local(target) => Edge::resolved(EdgeKind::Calls, source, target, span),
            ResolvedRef::Imported(fqn) => Edge::unresolved(EdgeKind::Calls, source, fqn, span),
            ResolvedRef::Unknown => {
                Edge::unresolved(EdgeKind::Calls, source, callee.to_string(), span)
            }
        };
        edge.attrs.arg_count = Some(arg_count);
        self.edges.push(edge);
    }

    /// Append a pre-built edge (decorator edges carry an explicit source)
    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    // ── signatures ──────────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    fn build_signature(
        &mut self,
        owner_node_id: &str,
        name: &str,
        params: &[ParamInfo],
        return_type: Option<&str>,
        visibility: Visibility,
        is_async: bool,
        is_static: bool,
        throws: &[String],
    ) -> SignatureEntity {
        let param_raws: Vec<String> = params
            .iter()
            .map(|p| p.type_annotation.clone().unwrap_or_default())
            .collect();

        let raw = format_signature(name, params, return_type);
        let parameter_type_ids = params
            .iter()
            .filter_map(|p| {
                p.type_annotation
                    .as_deref()
                    .and_then(|t| self.type_resolver.resolve(t))
            })
            .collect();
        let return_type_id = return_type.and_then(|t| self.type_resolver.resolve(t));
        let throws_type_ids = throws
            .iter()
            .filter_map(|t| self.type_resolver.resolve(t))
            .collect();

        SignatureEntity {
            id: SignatureEntity::compute_id(owner_node_id),
            owner_node_id: owner_node_id.to_string(),
            name: name.to_string(),
            raw,
            parameter_type_ids,
            return_type_id,
            visibility,
            is_async,
            is_static,
            throws_type_ids,
            signature_hash: signature_hash(
                &param_raws,
                return_type,
                visibility,
                is_async,
                is_static,
                throws,
            ),
        }
    }

    // ── output ──────────────────────────────────────────────────────────

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn build(mut self) -> (Vec<Node>, Vec<Edge>, Vec<TypeEntity>, Vec<SignatureEntity>) {
        let types = self.type_resolver.take_entities();
        (self.nodes, self.edges, types, self.signatures)
    }
}

/// "add(self, x: int, y: int) -> int"
fn format_signature(name: &str, params: &[ParamInfo], return_type: Option<&str>) -> String {
    let params_str = params
        .iter()
        .map(|p| match &p.type_annotation {
            Some(t) => format!("{}: {}", p.name, t),
            None => p.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ");
    match return_type {
        Some(ret) => format!("{}({}) -> {}", name, params_str, ret),
        None => format!("{}({})", name, params_str),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(start: u32, end: u32) -> Span {
        Span::new(start, end, 1, 0, 1, (end - start) as u32)
    }

    fn builder() -> IrBuilder {
        IrBuilder::new("test-repo", "src/main.py", "python", "myapp.main", false)
    }

    #[test]
    fn test_fqn_building() {
        let mut b = builder();
        b.create_file_node(span(0, 100), "source");
        let class_id = b.create_class_node(
            NodeKind::Class,
            "MyClass",
            span(0, 50),
            None,
            None,
            "class MyClass: ...",
        );

        let class = b.nodes().iter().find(|n| n.id == class_id).unwrap();
        assert_eq!(class.fqn.as_deref(), Some("myapp.main.MyClass"));

        let method_id = b.create_function_node(
            "method1",
            span(10, 40),
            None,
            None,
            &[],
            None,
            Visibility::Public,
            false,
            false,
            &[],
            "def method1(self): ...",
        );
        let method = b.nodes().iter().find(|n| n.id == method_id).unwrap();
        assert_eq!(method.fqn.as_deref(), Some("myapp.main.MyClass.method1"));
        assert_eq!(method.kind, NodeKind::Method);
    }

    #[test]
    fn test_contains_edges_mirror_parent_id() {
        let mut b = builder();
        let file_id = b.create_file_node(span(0, 100), "source");
        let class_id = b.create_class_node(
            NodeKind::Class,
            "C",
            span(0, 50),
            None,
            None,
            "class C: ...",
        );

        let class = b.nodes().iter().find(|n| n.id == class_id).unwrap();
        assert_eq!(class.parent_id.as_deref(), Some(file_id.as_str()));

        let contains: Vec<_> = b
            .edges()
            .iter()
            .filter(|e| e.kind == EdgeKind::Contains)
            .collect();
        assert_eq!(contains.len(), 1);
        assert_eq!(contains[0].source_id, file_id);
        assert_eq!(contains[0].target_id.as_deref(), Some(class_id.as_str()));
    }

    #[test]
    fn test_parameter_resolution() {
        let mut b = builder();
        b.create_file_node(span(0, 100), "source");
        b.create_function_node(
            "add",
            span(0, 60),
            None,
            None,
            &[
                ParamInfo {
                    name: "x".to_string(),
                    type_annotation: Some("int".to_string()),
                    span: span(8, 14),
                },
                ParamInfo {
                    name: "y".to_string(),
                    type_annotation: Some("int".to_string()),
                    span: span(16, 22),
                },
            ],
            Some("int"),
            Visibility::Public,
            false,
            false,
            &[],
            "def add(x: int, y: int) -> int: return x + y",
        );

        // Reads of x and y resolve to the parameter nodes
        assert!(matches!(b.resolve_name("x"), ResolvedRef::Local(_)));
        assert!(matches!(b.resolve_name("y"), ResolvedRef::Local(_)));
        assert!(matches!(b.resolve_name("z"), ResolvedRef::Unknown));
    }

    #[test]
    fn test_import_resolution() {
        let mut b = builder();
        b.create_file_node(span(0, 100), "source");
        b.create_import_node(
            &ImportInfo {
                module: "a".to_string(),
                name: Some("foo".to_string()),
                alias: None,
                is_from_import: true,
                span: span(0, 17),
            },
            "from a import foo",
        );

        assert_eq!(b.resolve_name("foo"), ResolvedRef::Imported("a.foo".to_string()));
    }

    #[test]
    fn test_unresolved_call_keeps_name() {
        let mut b = builder();
        b.create_file_node(span(0, 100), "source");
        b.add_call_edge("helper", 2, span(10, 20));

        let call = b.edges().iter().find(|e| e.kind == EdgeKind::Calls).unwrap();
        assert!(call.target_id.is_none());
        assert_eq!(call.attrs.unresolved_name.as_deref(), Some("helper"));
        assert_eq!(call.attrs.arg_count, Some(2));
    }

    #[test]
    fn test_signature_raw_format() {
        let mut b = builder();
        b.create_file_node(span(0, 100), "source");
        let id = b.create_function_node(
            "add",
            span(0, 60),
            None,
            None,
            &[
                ParamInfo {
                    name: "self".to_string(),
                    type_annotation: None,
                    span: span(8, 12),
                },
                ParamInfo {
                    name: "x".to_string(),
                    type_annotation: Some("int".to_string()),
                    span: span(14, 20),
                },
            ],
            Some("int"),
            Visibility::Public,
            false,
            false,
            &[],
            "def add(self, x: int) -> int: ...",
        );

        let (nodes, _, _, sigs) = b.build();
        let func = nodes.iter().find(|n| n.id == id).unwrap();
        let sig = sigs.iter().find(|s| s.owner_node_id == id).unwrap();
        assert_eq!(func.signature_id.as_deref(), Some(sig.id.as_str()));
        assert_eq!(sig.raw, "add(self, x: int) -> int");
        assert_eq!(sig.parameter_type_ids.len(), 1);
        assert!(sig.return_type_id.is_some());
    }

    #[test]
    fn test_lambda_fqn() {
        let mut b = builder();
        b.create_file_node(span(0, 100), "source");
        let id = b.create_lambda_node(Span::new(10, 20, 3, 8, 3, 18), "lambda x: x");
        let lambda = b.nodes().iter().find(|n| n.id == id).unwrap();
        assert!(lambda.name.is_none());
        assert_eq!(lambda.fqn.as_deref(), Some("myapp.main.λ3:8"));
    }
}
