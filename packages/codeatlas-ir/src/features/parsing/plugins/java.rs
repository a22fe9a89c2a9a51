//! Java language plugin

use tree_sitter::Language as TSLanguage;

use crate::features::parsing::domain::{SyntaxKind, SyntaxNode};
use crate::features::parsing::ports::{
    HeritageInfo, ImportInfo, LanguageId, LanguagePlugin, ParamInfo,
};
use crate::shared::models::Visibility;

pub struct JavaPlugin;

impl JavaPlugin {
    fn modifiers_text<'a>(&self, def: &'a SyntaxNode, source: &'a str) -> Option<&'a str> {
        def.children
            .iter()
            .find(|c| c.raw_kind == "modifiers")
            .map(|m| m.text(source))
    }
}

impl LanguagePlugin for JavaPlugin {
    fn language_id(&self) -> LanguageId {
        LanguageId::Java
    }

    fn tree_sitter_language(&self) -> TSLanguage {
        tree_sitter_java::language()
    }

    fn map_syntax_kind(&self, raw_kind: &str) -> SyntaxKind {
        match raw_kind {
            "method_declaration" | "constructor_declaration" => SyntaxKind::MethodDef,
            "class_declaration" => SyntaxKind::ClassDef,
            "interface_declaration" | "annotation_type_declaration" => SyntaxKind::InterfaceDef,
            "enum_declaration" => SyntaxKind::EnumDef,
            "lambda_expression" => SyntaxKind::LambdaDef,

            "assignment_expression" => SyntaxKind::AssignmentStmt,
            "formal_parameter" | "spread_parameter" => SyntaxKind::ParameterDecl,
            "field_declaration" => SyntaxKind::FieldDecl,
            "local_variable_declaration" => SyntaxKind::AssignmentStmt,
            "import_declaration" => SyntaxKind::ImportDecl,
            "package_declaration" => SyntaxKind::PackageDecl,

            "method_invocation" | "object_creation_expression" => SyntaxKind::CallExpr,
            "identifier" => SyntaxKind::NameExpr,
            "field_access" => SyntaxKind::AttributeExpr,
            "decimal_integer_literal" | "string_literal" | "true" | "false" | "null_literal" => {
                SyntaxKind::LiteralExpr
            }
            "binary_expression" => SyntaxKind::BinaryExpr,
            "unary_expression" => SyntaxKind::UnaryExpr,

            "return_statement" => SyntaxKind::ReturnStmt,
            "if_statement" | "ternary_expression" | "switch_expression" => SyntaxKind::IfStmt,
            "for_statement" | "enhanced_for_statement" => SyntaxKind::ForStmt,
            "while_statement" | "do_statement" => SyntaxKind::WhileStmt,
            "try_statement" | "try_with_resources_statement" => SyntaxKind::TryStmt,

            "break_statement" => SyntaxKind::BreakStmt,
            "continue_statement" => SyntaxKind::ContinueStmt,
            "throw_statement" => SyntaxKind::RaiseStmt,

            "block" | "class_body" | "interface_body" | "enum_body" | "program" => SyntaxKind::Block,
            "line_comment" | "block_comment" => SyntaxKind::Comment,
            "marker_annotation" | "annotation" => SyntaxKind::Decorator,
            "type_identifier" | "generic_type" => SyntaxKind::TypeAnnotation,
            "ERROR" => SyntaxKind::Error,

            other => SyntaxKind::Other(other.to_string()),
        }
    }

    /// Package declaration wins over file layout: `package com.example;`
    fn module_path(&self, _file_path: &str, root: &SyntaxNode, source: &str) -> Option<String> {
        let pkg = root
            .children
            .iter()
            .find(|c| c.kind == SyntaxKind::PackageDecl)?;
        pkg.children
            .iter()
            .find(|c| matches!(c.raw_kind.as_str(), "scoped_identifier" | "identifier"))
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
        def.child_by_field("type").map(|t| t.text(source).to_string())
    }

    fn heritage(&self, class: &SyntaxNode, source: &str) -> Vec<HeritageInfo> {
        let mut result = Vec::new();
        // `extends Base`
        if let Some(superclass) = class.child_by_field("superclass") {
            if let Some(ty) = superclass
                .children
                .iter()
                .find(|c| c.kind == SyntaxKind::TypeAnnotation)
            {
                result.push(HeritageInfo {
                    name: ty.text(source).to_string(),
                    is_interface: false,
                    span: ty.span,
                });
            }
        }
        // `implements I, J`
        if let Some(interfaces) = class.child_by_field("interfaces") {
            let mut stack = vec![interfaces];
            while let Some(node) = stack.pop() {
                for child in &node.children {
                    if child.kind == SyntaxKind::TypeAnnotation {
                        result.push(HeritageInfo {
                            name: child.text(source).to_string(),
                            is_interface: true,
                            span: child.span,
                        });
                    } else {
                        stack.push(child);
                    }
                }
            }
        }
        result
    }

    fn visibility(&self, def: &SyntaxNode, source: &str) -> Visibility {
        match self.modifiers_text(def, source) {
            Some(m) if m.contains("private") => Visibility::Private,
            Some(m) if m.contains("protected") => Visibility::Protected,
            Some(m) if m.contains("public") => Visibility::Public,
            // Package-private default
            _ => Visibility::Internal,
        }
    }

    /// `import com.example.Util;` → module "com.example", name "Util"
    fn imports(&self, node: &SyntaxNode, source: &str) -> Vec<ImportInfo> {
        let Some(scoped) = node
            .children
            .iter()
            .find(|c| matches!(c.raw_kind.as_str(), "scoped_identifier" | "identifier"))
        else {
            return Vec::new();
        };
        let full = scoped.text(source);
        let (module, name) = match full.rsplit_once('.') {
            Some((module, name)) => (module.to_string(), Some(name.to_string())),
            None => (full.to_string(), None),
        };
        vec![ImportInfo {
            module,
            name,
            alias: None,
            is_from_import: true,
            span: node.span,
        }]
    }

    fn is_async(&self, _def: &SyntaxNode, _source: &str) -> bool {
        false
    }

    fn is_static(&self, def: &SyntaxNode, source: &str) -> bool {
        self.modifiers_text(def, source)
            .is_some_and(|m| m.contains("static"))
    }

    /// `throws IOException, SQLException`
    fn throws_clause(&self, def: &SyntaxNode, source: &str) -> Vec<String> {
        let Some(throws) = def.children.iter().find(|c| c.raw_kind == "throws") else {
            return Vec::new();
        };
        throws
            .children
            .iter()
            .filter(|c| c.kind == SyntaxKind::TypeAnnotation)
            .map(|t| t.text(source).to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let plugin = JavaPlugin;
        assert_eq!(plugin.map_syntax_kind("method_declaration"), SyntaxKind::MethodDef);
        assert_eq!(plugin.map_syntax_kind("class_declaration"), SyntaxKind::ClassDef);
        assert_eq!(plugin.map_syntax_kind("interface_declaration"), SyntaxKind::InterfaceDef);
        assert_eq!(plugin.map_syntax_kind("throw_statement"), SyntaxKind::RaiseStmt);
        assert_eq!(plugin.map_syntax_kind("package_declaration"), SyntaxKind::PackageDecl);
    }
}
