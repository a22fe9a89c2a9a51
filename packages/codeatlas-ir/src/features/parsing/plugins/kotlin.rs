//! Kotlin language plugin
//!
//! The Kotlin grammar names few fields, so name extraction falls back to
//! scanning for identifier children.

use tree_sitter::Language as TSLanguage;

use crate::features::parsing::domain::{SyntaxKind, SyntaxNode};
use crate::features::parsing::ports::{LanguageId, LanguagePlugin, ParamInfo};
use crate::shared::models::Visibility;

pub struct KotlinPlugin;

impl LanguagePlugin for KotlinPlugin {
    fn language_id(&self) -> LanguageId {
        LanguageId::Kotlin
    }

    fn tree_sitter_language(&self) -> TSLanguage {
        tree_sitter_kotlin::language()
    }

    fn map_syntax_kind(&self, raw_kind: &str) -> SyntaxKind {
        match raw_kind {
            "function_declaration" => SyntaxKind::FunctionDef,
            "class_declaration" => SyntaxKind::ClassDef,
            "object_declaration" => SyntaxKind::ClassDef,
            "lambda_literal" | "anonymous_function" => SyntaxKind::LambdaDef,

            "assignment" => SyntaxKind::AssignmentStmt,
            "parameter" | "class_parameter" => SyntaxKind::ParameterDecl,
            "property_declaration" => SyntaxKind::FieldDecl,
            "import_header" => SyntaxKind::ImportDecl,
            "package_header" => SyntaxKind::PackageDecl,

            "call_expression" => SyntaxKind::CallExpr,
            "simple_identifier" => SyntaxKind::NameExpr,
            "navigation_expression" => SyntaxKind::AttributeExpr,
            "integer_literal" | "string_literal" | "boolean_literal" | "null" => {
                SyntaxKind::LiteralExpr
            }

            "if_expression" | "when_expression" => SyntaxKind::IfStmt,
            "for_statement" => SyntaxKind::ForStmt,
            "while_statement" | "do_while_statement" => SyntaxKind::WhileStmt,
            "try_expression" => SyntaxKind::TryStmt,

            "jump_expression" => SyntaxKind::ReturnStmt,

            "statements" | "class_body" | "function_body" | "source_file" => SyntaxKind::Block,
            "comment" | "line_comment" | "multiline_comment" => SyntaxKind::Comment,
            "annotation" => SyntaxKind::Decorator,
            "type_identifier" | "user_type" => SyntaxKind::TypeAnnotation,
            "ERROR" => SyntaxKind::Error,

            other => SyntaxKind::Other(other.to_string()),
        }
    }

    fn module_path(&self, _file_path: &str, root: &SyntaxNode, source: &str) -> Option<String> {
        let pkg = root
            .children
            .iter()
            .find(|c| c.kind == SyntaxKind::PackageDecl)?;
        pkg.children
            .iter()
            .find(|c| matches!(c.raw_kind.as_str(), "identifier" | "qualified_identifier"))
            .map(|n| n.text(source).to_string())
    }

    fn definition_name<'a>(&self, def: &SyntaxNode, source: &'a str) -> Option<&'a str> {
        def.children
            .iter()
            .find(|c| matches!(c.raw_kind.as_str(), "simple_identifier" | "type_identifier"))
            .map(|n| n.text(source))
    }

    fn parameters(&self, def: &SyntaxNode, source: &str) -> Vec<ParamInfo> {
        let mut result = Vec::new();
        def.walk(&mut |node| {
            if node.kind == SyntaxKind::ParameterDecl {
                let name = node
                    .children
                    .iter()
                    .find(|c| c.raw_kind == "simple_identifier")
                    .map(|n| n.text(source).to_string());
                if let Some(name) = name {
                    result.push(ParamInfo {
                        name,
                        type_annotation: node
                            .children
                            .iter()
                            .find(|c| c.kind == SyntaxKind::TypeAnnotation)
                            .map(|t| t.text(source).to_string()),
                        span: node.span,
                    });
                }
            }
        });
        result
    }

    fn visibility(&self, def: &SyntaxNode, source: &str) -> Visibility {
        let head = def.text(source);
        let head = &head[..head.len().min(64)];
        if head.contains("private ") {
            Visibility::Private
        } else if head.contains("protected ") {
            Visibility::Protected
        } else if head.contains("internal ") {
            Visibility::Internal
        } else {
            Visibility::Public
        }
    }

    fn is_async(&self, def: &SyntaxNode, source: &str) -> bool {
        let head = def.text(source);
        head[..head.len().min(64)].contains("suspend ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let plugin = KotlinPlugin;
        assert_eq!(plugin.map_syntax_kind("function_declaration"), SyntaxKind::FunctionDef);
        assert_eq!(plugin.map_syntax_kind("object_declaration"), SyntaxKind::ClassDef);
        assert_eq!(plugin.map_syntax_kind("import_header"), SyntaxKind::ImportDecl);
        assert_eq!(plugin.map_syntax_kind("when_expression"), SyntaxKind::IfStmt);
    }
}
