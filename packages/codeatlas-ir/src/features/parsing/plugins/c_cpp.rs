//! C and C++ language plugins
//!
//! The C++ grammar is a superset of the C grammar for everything this
//! pipeline extracts; the shared mapping covers both and the C++ plugin
//! adds class/namespace kinds on top.

use tree_sitter::Language as TSLanguage;

use crate::features::parsing::domain::{SyntaxKind, SyntaxNode};
use crate::features::parsing::ports::{LanguageId, LanguagePlugin, ParamInfo};
use crate::shared::models::Visibility;

fn map_c_kind(raw_kind: &str) -> SyntaxKind {
    match raw_kind {
        "function_definition" => SyntaxKind::FunctionDef,
        "struct_specifier" | "union_specifier" => SyntaxKind::ClassDef,
        "enum_specifier" => SyntaxKind::EnumDef,

        "assignment_expression" => SyntaxKind::AssignmentStmt,
        "parameter_declaration" => SyntaxKind::ParameterDecl,
        "field_declaration" => SyntaxKind::FieldDecl,
        "declaration" => SyntaxKind::AssignmentStmt,
        "preproc_include" => SyntaxKind::ImportDecl,

        "call_expression" => SyntaxKind::CallExpr,
        "identifier" => SyntaxKind::NameExpr,
        "field_expression" => SyntaxKind::AttributeExpr,
        "number_literal" | "string_literal" | "char_literal" | "true" | "false" => {
            SyntaxKind::LiteralExpr
        }
        "binary_expression" => SyntaxKind::BinaryExpr,
        "unary_expression" => SyntaxKind::UnaryExpr,

        "return_statement" => SyntaxKind::ReturnStmt,
        "if_statement" | "switch_statement" | "conditional_expression" => SyntaxKind::IfStmt,
        "for_statement" => SyntaxKind::ForStmt,
        "while_statement" | "do_statement" => SyntaxKind::WhileStmt,

        "break_statement" => SyntaxKind::BreakStmt,
        "continue_statement" => SyntaxKind::ContinueStmt,

        "compound_statement" | "translation_unit" | "field_declaration_list" => SyntaxKind::Block,
        "comment" => SyntaxKind::Comment,
        "type_identifier" | "primitive_type" | "sized_type_specifier" => SyntaxKind::TypeAnnotation,
        "ERROR" => SyntaxKind::Error,

        other => SyntaxKind::Other(other.to_string()),
    }
}

/// Function names hide inside the declarator chain:
/// `int main(int argc)` → declarator → function_declarator → identifier
fn c_definition_name<'a>(def: &SyntaxNode, source: &'a str) -> Option<&'a str> {
    let mut node = def.child_by_field("declarator")?;
    loop {
        if matches!(node.raw_kind.as_str(), "identifier" | "field_identifier") {
            return Some(node.text(source));
        }
        node = node
            .child_by_field("declarator")
            .or_else(|| node.children.iter().find(|c| c.raw_kind == "identifier"))?;
    }
}

fn c_parameters(def: &SyntaxNode, source: &str) -> Vec<ParamInfo> {
    let mut result = Vec::new();
    def.walk(&mut |node| {
        if node.kind == SyntaxKind::ParameterDecl {
            let name = node
                .children
                .iter()
                .find(|c| c.raw_kind == "identifier")
                .or_else(|| {
                    node.child_by_field("declarator")
                        .filter(|d| d.raw_kind == "identifier")
                })
                .map(|n| n.text(source).to_string());
            if let Some(name) = name {
                result.push(ParamInfo {
                    name,
                    type_annotation: node
                        .child_by_field("type")
                        .map(|t| t.text(source).to_string()),
                    span: node.span,
                });
            }
        }
    });
    result
}

pub struct CPlugin;

impl LanguagePlugin for CPlugin {
    fn language_id(&self) -> LanguageId {
        LanguageId::C
    }

    fn tree_sitter_language(&self) -> TSLanguage {
        tree_sitter_c::language()
    }

    fn map_syntax_kind(&self, raw_kind: &str) -> SyntaxKind {
        map_c_kind(raw_kind)
    }

    fn definition_name<'a>(&self, def: &SyntaxNode, source: &'a str) -> Option<&'a str> {
        c_definition_name(def, source).or_else(|| {
            def.child_by_field("name").map(|n| n.text(source))
        })
    }

    fn parameters(&self, def: &SyntaxNode, source: &str) -> Vec<ParamInfo> {
        c_parameters(def, source)
    }

    fn return_type(&self, def: &SyntaxNode, source: &str) -> Option<String> {
        def.child_by_field("type").map(|t| t.text(source).to_string())
    }

    fn is_async(&self, _def: &SyntaxNode, _source: &str) -> bool {
        false
    }
}

pub struct CppPlugin;

impl LanguagePlugin for CppPlugin {
    fn language_id(&self) -> LanguageId {
        LanguageId::Cpp
    }

    fn tree_sitter_language(&self) -> TSLanguage {
        tree_sitter_cpp::language()
    }

    fn map_syntax_kind(&self, raw_kind: &str) -> SyntaxKind {
        match raw_kind {
            "class_specifier" => SyntaxKind::ClassDef,
            "namespace_definition" => SyntaxKind::ClassDef,
            "lambda_expression" => SyntaxKind::LambdaDef,
            "throw_statement" => SyntaxKind::RaiseStmt,
            "try_statement" => SyntaxKind::TryStmt,
            other => map_c_kind(other),
        }
    }

    fn definition_name<'a>(&self, def: &SyntaxNode, source: &'a str) -> Option<&'a str> {
        def.child_by_field("name")
            .map(|n| n.text(source))
            .or_else(|| c_definition_name(def, source))
    }

    fn parameters(&self, def: &SyntaxNode, source: &str) -> Vec<ParamInfo> {
        c_parameters(def, source)
    }

    fn return_type(&self, def: &SyntaxNode, source: &str) -> Option<String> {
        def.child_by_field("type").map(|t| t.text(source).to_string())
    }

    fn visibility(&self, _def: &SyntaxNode, _source: &str) -> Visibility {
        // Access specifiers are section markers in the class body; the
        // extractor does not track them, so default to public
        Visibility::Public
    }

    fn is_async(&self, _def: &SyntaxNode, _source: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_c_mapping() {
        let plugin = CPlugin;
        assert_eq!(plugin.map_syntax_kind("function_definition"), SyntaxKind::FunctionDef);
        assert_eq!(plugin.map_syntax_kind("preproc_include"), SyntaxKind::ImportDecl);
        assert_eq!(plugin.map_syntax_kind("struct_specifier"), SyntaxKind::ClassDef);
    }

    #[test]
    fn test_cpp_extends_c() {
        let plugin = CppPlugin;
        assert_eq!(plugin.map_syntax_kind("class_specifier"), SyntaxKind::ClassDef);
        assert_eq!(plugin.map_syntax_kind("throw_statement"), SyntaxKind::RaiseStmt);
        // Shared C kinds still map
        assert_eq!(plugin.map_syntax_kind("call_expression"), SyntaxKind::CallExpr);
    }
}
