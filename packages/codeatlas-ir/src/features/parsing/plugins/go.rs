//! Go language plugin

use tree_sitter::Language as TSLanguage;

use crate::features::parsing::domain::{SyntaxKind, SyntaxNode};
use crate::features::parsing::ports::{LanguageId, LanguagePlugin, ParamInfo};
use crate::shared::models::Visibility;

pub struct GoPlugin;

impl LanguagePlugin for GoPlugin {
    fn language_id(&self) -> LanguageId {
        LanguageId::Go
    }

    fn tree_sitter_language(&self) -> TSLanguage {
        tree_sitter_go::language()
    }

    fn map_syntax_kind(&self, raw_kind: &str) -> SyntaxKind {
        match raw_kind {
            "function_declaration" => SyntaxKind::FunctionDef,
            "method_declaration" => SyntaxKind::MethodDef,
            "type_declaration" => SyntaxKind::ClassDef,
            "func_literal" => SyntaxKind::LambdaDef,

            "assignment_statement" => SyntaxKind::AssignmentStmt,
            "short_var_declaration" => SyntaxKind::AssignmentStmt,
            "parameter_declaration" | "variadic_parameter_declaration" => SyntaxKind::ParameterDecl,
            "field_declaration" => SyntaxKind::FieldDecl,
            "var_declaration" | "const_declaration" => SyntaxKind::AssignmentStmt,
            "import_declaration" => SyntaxKind::ImportDecl,
            "package_clause" => SyntaxKind::PackageDecl,

            "call_expression" => SyntaxKind::CallExpr,
            "identifier" => SyntaxKind::NameExpr,
            "selector_expression" => SyntaxKind::AttributeExpr,
            "int_literal" | "interpreted_string_literal" | "raw_string_literal" | "true"
            | "false" | "nil" => SyntaxKind::LiteralExpr,
            "binary_expression" => SyntaxKind::BinaryExpr,
            "unary_expression" => SyntaxKind::UnaryExpr,

            "return_statement" => SyntaxKind::ReturnStmt,
            "if_statement" | "expression_switch_statement" | "type_switch_statement" => {
                SyntaxKind::IfStmt
            }
            "for_statement" => SyntaxKind::ForStmt,

            "break_statement" => SyntaxKind::BreakStmt,
            "continue_statement" => SyntaxKind::ContinueStmt,

            "block" | "source_file" => SyntaxKind::Block,
            "comment" => SyntaxKind::Comment,
            "type_identifier" | "pointer_type" | "slice_type" | "map_type" => {
                SyntaxKind::TypeAnnotation
            }
            "ERROR" => SyntaxKind::Error,

            other => SyntaxKind::Other(other.to_string()),
        }
    }

    /// `package foo` wins over file layout
    fn module_path(&self, _file_path: &str, root: &SyntaxNode, source: &str) -> Option<String> {
        let pkg = root
            .children
            .iter()
            .find(|c| c.kind == SyntaxKind::PackageDecl)?;
        pkg.children
            .iter()
            .find(|c| c.raw_kind == "package_identifier")
            .map(|n| n.text(source).to_string())
    }

    fn parameters(&self, def: &SyntaxNode, source: &str) -> Vec<ParamInfo> {
        let Some(params) = def.child_by_field("parameters") else {
            return Vec::new();
        };
        params
            .children
            .iter()
            .filter(|c| c.kind == SyntaxKind::ParameterDecl)
            .filter_map(|p| {
                let name = p.child_by_field("name")?.text(source).to_string();
                let type_annotation = p.child_by_field("type").map(|t| t.text(source).to_string());
                Some(ParamInfo {
                    name,
                    type_annotation,
                    span: p.span,
                })
            })
            .collect()
    }

    fn return_type(&self, def: &SyntaxNode, source: &str) -> Option<String> {
        def.child_by_field("result").map(|t| t.text(source).to_string())
    }

    /// Exported = uppercase initial
    fn visibility(&self, def: &SyntaxNode, source: &str) -> Visibility {
        match self.definition_name(def, source) {
            Some(name) if name.chars().next().is_some_and(|c| c.is_uppercase()) => {
                Visibility::Public
            }
            _ => Visibility::Internal,
        }
    }

    fn is_async(&self, _def: &SyntaxNode, _source: &str) -> bool {
        false
    }
}
