//! TypeScript / JavaScript language plugins
//!
//! The two grammars share node kinds for everything this pipeline
//! extracts, so one mapping serves both; only the grammar handle and the
//! language id differ. `.tsx` uses the TSX grammar variant.

use tree_sitter::Language as TSLanguage;

use crate::features::parsing::domain::{SyntaxKind, SyntaxNode};
use crate::features::parsing::ports::{
    HeritageInfo, ImportInfo, LanguageId, LanguagePlugin, ParamInfo,
};
use crate::shared::models::Visibility;

fn map_ecma_kind(raw_kind: &str) -> SyntaxKind {
    match raw_kind {
        "function_declaration" | "function_expression" | "generator_function_declaration" => {
            SyntaxKind::FunctionDef
        }
        "method_definition" => SyntaxKind::MethodDef,
        "class_declaration" | "class" => SyntaxKind::ClassDef,
        "interface_declaration" => SyntaxKind::InterfaceDef,
        "enum_declaration" => SyntaxKind::EnumDef,
        "arrow_function" => SyntaxKind::LambdaDef,

        "assignment_expression" => SyntaxKind::AssignmentStmt,
        "augmented_assignment_expression" => SyntaxKind::AugAssignmentStmt,
        "required_parameter" | "optional_parameter" => SyntaxKind::ParameterDecl,
        "public_field_definition" | "property_signature" => SyntaxKind::FieldDecl,
        "lexical_declaration" | "variable_declaration" => SyntaxKind::AssignmentStmt,
        "import_statement" => SyntaxKind::ImportDecl,

        "call_expression" | "new_expression" => SyntaxKind::CallExpr,
        "identifier" => SyntaxKind::NameExpr,
        "member_expression" => SyntaxKind::AttributeExpr,
        "string" | "number" | "true" | "false" | "null" | "undefined" => SyntaxKind::LiteralExpr,
        "binary_expression" => SyntaxKind::BinaryExpr,
        "unary_expression" => SyntaxKind::UnaryExpr,

        "return_statement" => SyntaxKind::ReturnStmt,
        "if_statement" | "ternary_expression" | "switch_statement" => SyntaxKind::IfStmt,
        "for_statement" | "for_in_statement" => SyntaxKind::ForStmt,
        "while_statement" | "do_statement" => SyntaxKind::WhileStmt,
        "try_statement" => SyntaxKind::TryStmt,

        "break_statement" => SyntaxKind::BreakStmt,
        "continue_statement" => SyntaxKind::ContinueStmt,
        "throw_statement" => SyntaxKind::RaiseStmt,
        "yield_expression" => SyntaxKind::YieldExpr,

        "statement_block" | "class_body" | "program" => SyntaxKind::Block,
        "comment" => SyntaxKind::Comment,
        "decorator" => SyntaxKind::Decorator,
        "type_annotation" | "type_identifier" => SyntaxKind::TypeAnnotation,
        "ERROR" => SyntaxKind::Error,

        other => SyntaxKind::Other(other.to_string()),
    }
}

fn ecma_parameters(def: &SyntaxNode, source: &str) -> Vec<ParamInfo> {
    let Some(params) = def.child_by_field("parameters") else {
        return Vec::new();
    };
    params
        .children
        .iter()
        .filter(|c| {
            c.kind == SyntaxKind::ParameterDecl || c.raw_kind == "identifier"
        })
        .filter_map(|p| {
            let name = if p.raw_kind == "identifier" {
                p.text(source).to_string()
            } else {
                p.child_by_field("pattern")?.text(source).to_string()
            };
            let type_annotation = p.child_by_field("type").map(|t| {
                t.text(source).trim_start_matches(':').trim().to_string()
            });
            Some(ParamInfo {
                name,
                type_annotation,
                span: p.span,
            })
        })
        .collect()
}

fn ecma_heritage(class: &SyntaxNode, source: &str) -> Vec<HeritageInfo> {
    // class_heritage holds extends_clause and implements_clause
    let Some(heritage) = class
        .children
        .iter()
        .find(|c| c.raw_kind == "class_heritage")
    else {
        return Vec::new();
    };
    let mut result = Vec::new();
    for clause in &heritage.children {
        let is_interface = clause.raw_kind == "implements_clause";
        if clause.raw_kind == "extends_clause" || is_interface {
            for child in &clause.children {
                if matches!(
                    child.raw_kind.as_str(),
                    "identifier" | "type_identifier" | "member_expression" | "generic_type"
                ) {
                    result.push(HeritageInfo {
                        name: child.text(source).to_string(),
                        is_interface,
                        span: child.span,
                    });
                }
            }
        }
    }
    result
}

/// `import { a, b as c } from "./mod"` and `import d from "./mod"`
fn ecma_imports(node: &SyntaxNode, source: &str) -> Vec<ImportInfo> {
    let Some(module) = node.child_by_field("source").map(|s| {
        s.text(source)
            .trim_matches(|c| c == '"' || c == '\'')
            .trim_start_matches("./")
            .replace('/', ".")
    }) else {
        return Vec::new();
    };
    let mut result = Vec::new();
    let mut stack: Vec<&SyntaxNode> = node.children.iter().collect();
    while let Some(n) = stack.pop() {
        match n.raw_kind.as_str() {
            "import_specifier" => {
                let name = n.child_by_field("name").map(|x| x.text(source).to_string());
                let alias = n.child_by_field("alias").map(|x| x.text(source).to_string());
                result.push(ImportInfo {
                    module: module.clone(),
                    name,
                    alias,
                    is_from_import: true,
                    span: node.span,
                });
            }
            "import_clause" | "named_imports" | "namespace_import" => {
                stack.extend(n.children.iter());
            }
            "identifier" => {
                // Default import binding
                result.push(ImportInfo {
                    module: module.clone(),
                    name: None,
                    alias: Some(n.text(source).to_string()),
                    is_from_import: true,
                    span: node.span,
                });
            }
            _ => {}
        }
    }
    if result.is_empty() {
        // Bare `import "./mod"` side-effect import
        result.push(ImportInfo {
            module,
            name: None,
            alias: None,
            is_from_import: false,
            span: node.span,
        });
    }
    result
}

fn ecma_visibility(def: &SyntaxNode, source: &str) -> Visibility {
    let head = def.text(source);
    let head = &head[..head.len().min(64)];
    if head.contains("private ") || head.starts_with('#') {
        Visibility::Private
    } else if head.contains("protected ") {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

pub struct TypeScriptPlugin {
    tsx: bool,
}

impl TypeScriptPlugin {
    pub fn new() -> Self {
        Self { tsx: false }
    }

    pub fn tsx() -> Self {
        Self { tsx: true }
    }
}

impl Default for TypeScriptPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguagePlugin for TypeScriptPlugin {
    fn language_id(&self) -> LanguageId {
        LanguageId::TypeScript
    }

    fn tree_sitter_language(&self) -> TSLanguage {
        if self.tsx {
            tree_sitter_typescript::language_tsx()
        } else {
            tree_sitter_typescript::language_typescript()
        }
    }

    fn map_syntax_kind(&self, raw_kind: &str) -> SyntaxKind {
        map_ecma_kind(raw_kind)
    }

    fn parameters(&self, def: &SyntaxNode, source: &str) -> Vec<ParamInfo> {
        ecma_parameters(def, source)
    }

    fn return_type(&self, def: &SyntaxNode, source: &str) -> Option<String> {
        def.child_by_field("return_type")
            .map(|t| t.text(source).trim_start_matches(':').trim().to_string())
    }

    fn heritage(&self, class: &SyntaxNode, source: &str) -> Vec<HeritageInfo> {
        ecma_heritage(class, source)
    }

    fn visibility(&self, def: &SyntaxNode, source: &str) -> Visibility {
        ecma_visibility(def, source)
    }

    fn imports(&self, node: &SyntaxNode, source: &str) -> Vec<ImportInfo> {
        ecma_imports(node, source)
    }
}

pub struct JavaScriptPlugin;

impl LanguagePlugin for JavaScriptPlugin {
    fn language_id(&self) -> LanguageId {
        LanguageId::JavaScript
    }

    fn tree_sitter_language(&self) -> TSLanguage {
        tree_sitter_javascript::language()
    }

    fn map_syntax_kind(&self, raw_kind: &str) -> SyntaxKind {
        map_ecma_kind(raw_kind)
    }

    fn parameters(&self, def: &SyntaxNode, source: &str) -> Vec<ParamInfo> {
        ecma_parameters(def, source)
    }

    fn heritage(&self, class: &SyntaxNode, source: &str) -> Vec<HeritageInfo> {
        ecma_heritage(class, source)
    }

    fn visibility(&self, def: &SyntaxNode, source: &str) -> Visibility {
        ecma_visibility(def, source)
    }

    fn imports(&self, node: &SyntaxNode, source: &str) -> Vec<ImportInfo> {
        ecma_imports(node, source)
    }
}
