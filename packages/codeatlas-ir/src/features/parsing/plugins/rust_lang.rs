//! Rust language plugin

use tree_sitter::Language as TSLanguage;

use crate::features::parsing::domain::{SyntaxKind, SyntaxNode};
use crate::features::parsing::ports::{HeritageInfo, LanguageId, LanguagePlugin, ParamInfo};
use crate::shared::models::Visibility;

pub struct RustPlugin;

impl LanguagePlugin for RustPlugin {
    fn language_id(&self) -> LanguageId {
        LanguageId::Rust
    }

    fn tree_sitter_language(&self) -> TSLanguage {
        tree_sitter_rust::language()
    }

    fn map_syntax_kind(&self, raw_kind: &str) -> SyntaxKind {
        match raw_kind {
            "function_item" | "function_signature_item" => SyntaxKind::FunctionDef,
            "struct_item" | "union_item" => SyntaxKind::ClassDef,
            "trait_item" => SyntaxKind::InterfaceDef,
            "enum_item" => SyntaxKind::EnumDef,
            "closure_expression" => SyntaxKind::LambdaDef,
            "mod_item" => SyntaxKind::ClassDef,

            "assignment_expression" => SyntaxKind::AssignmentStmt,
            "compound_assignment_expr" => SyntaxKind::AugAssignmentStmt,
            "parameter" | "self_parameter" => SyntaxKind::ParameterDecl,
            "field_declaration" => SyntaxKind::FieldDecl,
            "let_declaration" => SyntaxKind::AssignmentStmt,
            "use_declaration" => SyntaxKind::ImportDecl,

            "call_expression" | "macro_invocation" => SyntaxKind::CallExpr,
            "identifier" => SyntaxKind::NameExpr,
            "field_expression" | "scoped_identifier" => SyntaxKind::AttributeExpr,
            "integer_literal" | "string_literal" | "boolean_literal" | "float_literal" => {
                SyntaxKind::LiteralExpr
            }
            "binary_expression" => SyntaxKind::BinaryExpr,
            "unary_expression" => SyntaxKind::UnaryExpr,

            "return_expression" => SyntaxKind::ReturnStmt,
            "if_expression" | "match_expression" => SyntaxKind::IfStmt,
            "for_expression" => SyntaxKind::ForStmt,
            "while_expression" | "loop_expression" => SyntaxKind::WhileStmt,

            "break_expression" => SyntaxKind::BreakStmt,
            "continue_expression" => SyntaxKind::ContinueStmt,
            "yield_expression" => SyntaxKind::YieldExpr,

            "block" | "declaration_list" | "source_file" => SyntaxKind::Block,
            "line_comment" | "block_comment" => SyntaxKind::Comment,
            "attribute_item" => SyntaxKind::Decorator,
            "type_identifier" | "generic_type" | "reference_type" => SyntaxKind::TypeAnnotation,
            "ERROR" => SyntaxKind::Error,

            other => SyntaxKind::Other(other.to_string()),
        }
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
                if p.raw_kind == "self_parameter" {
                    return Some(ParamInfo {
                        name: "self".to_string(),
                        type_annotation: None,
                        span: p.span,
                    });
                }
                let name = p.child_by_field("pattern")?.text(source).to_string();
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
        def.child_by_field("return_type")
            .map(|t| t.text(source).to_string())
    }

    /// Trait impls surface as heritage on the type when written inline
    /// (`impl Trait for Type` blocks are separate items and resolved later
    /// by the graph builder through REFERENCES edges)
    fn heritage(&self, _class: &SyntaxNode, _source: &str) -> Vec<HeritageInfo> {
        Vec::new()
    }

    fn visibility(&self, def: &SyntaxNode, source: &str) -> Visibility {
        if def
            .children
            .iter()
            .any(|c| c.raw_kind == "visibility_modifier" && c.text(source).starts_with("pub"))
        {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    fn is_async(&self, def: &SyntaxNode, source: &str) -> bool {
        def.text(source).trim_start().starts_with("pub async")
            || def.text(source).trim_start().starts_with("async")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let plugin = RustPlugin;
        assert_eq!(plugin.map_syntax_kind("function_item"), SyntaxKind::FunctionDef);
        assert_eq!(plugin.map_syntax_kind("trait_item"), SyntaxKind::InterfaceDef);
        assert_eq!(plugin.map_syntax_kind("use_declaration"), SyntaxKind::ImportDecl);
        assert_eq!(plugin.map_syntax_kind("closure_expression"), SyntaxKind::LambdaDef);
    }
}
