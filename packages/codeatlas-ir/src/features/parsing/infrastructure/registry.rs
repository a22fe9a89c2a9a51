//! Parser registry
//!
//! Selects a language plugin by file extension and produces an owned
//! syntax tree with byte-precise spans. Partial parses are allowed: error
//! nodes are kept in the tree and reported as diagnostics.

use std::collections::HashMap;
use std::sync::Arc;

use tree_sitter::Parser as TSParser;

use crate::features::parsing::domain::{ParseDiagnostic, ParsedTree, SyntaxNode};
use crate::features::parsing::plugins::{
    CPlugin, CppPlugin, GoPlugin, JavaPlugin, JavaScriptPlugin, KotlinPlugin, PythonPlugin,
    RustPlugin, TypeScriptPlugin,
};
use crate::features::parsing::ports::{LanguageId, LanguagePlugin};
use crate::shared::models::{CodeatlasError, Result, Span};

/// Registry of language plugins keyed by extension
pub struct ParserRegistry {
    plugins: HashMap<LanguageId, Arc<dyn LanguagePlugin>>,
    /// TSX needs its own grammar variant even though it maps to TypeScript
    tsx_plugin: Arc<dyn LanguagePlugin>,
    /// Caller-supplied extension overrides, consulted before the fixed table
    overrides: HashMap<String, LanguageId>,
}

impl ParserRegistry {
    /// Registry with every built-in plugin installed
    pub fn with_default_plugins() -> Self {
        let mut plugins: HashMap<LanguageId, Arc<dyn LanguagePlugin>> = HashMap::new();
        plugins.insert(LanguageId::Python, Arc::new(PythonPlugin));
        plugins.insert(LanguageId::Java, Arc::new(JavaPlugin));
        plugins.insert(LanguageId::TypeScript, Arc::new(TypeScriptPlugin::new()));
        plugins.insert(LanguageId::JavaScript, Arc::new(JavaScriptPlugin));
        plugins.insert(LanguageId::Kotlin, Arc::new(KotlinPlugin));
        plugins.insert(LanguageId::Rust, Arc::new(RustPlugin));
        plugins.insert(LanguageId::Go, Arc::new(GoPlugin));
        plugins.insert(LanguageId::C, Arc::new(CPlugin));
        plugins.insert(LanguageId::Cpp, Arc::new(CppPlugin));
        Self {
            plugins,
            tsx_plugin: Arc::new(TypeScriptPlugin::tsx()),
            overrides: HashMap::new(),
        }
    }

    /// Override detection for an extension
    pub fn with_override(mut self, ext: impl Into<String>, language: LanguageId) -> Self {
        self.overrides.insert(ext.into().to_lowercase(), language);
        self
    }

    /// Detected language for a path, honoring overrides
    pub fn language_for(&self, file_path: &str) -> Option<LanguageId> {
        let ext = file_path.rsplit('.').next()?.to_lowercase();
        if let Some(lang) = self.overrides.get(&ext) {
            return Some(*lang);
        }
        LanguageId::from_extension(&ext)
    }

    pub fn plugin(&self, language: LanguageId) -> Option<Arc<dyn LanguagePlugin>> {
        self.plugins.get(&language).cloned()
    }

    /// Plugin for a concrete path (picks the TSX grammar for .tsx)
    pub fn plugin_for_path(&self, file_path: &str) -> Result<Arc<dyn LanguagePlugin>> {
        let language = self.language_for(file_path).ok_or_else(|| {
            CodeatlasError::unsupported_language(format!(
                "No parser registered for extension of {}",
                file_path
            ))
            .with_file(file_path)
        })?;
        if language == LanguageId::TypeScript && file_path.to_lowercase().ends_with(".tsx") {
            return Ok(self.tsx_plugin.clone());
        }
        self.plugin(language).ok_or_else(|| {
            CodeatlasError::unsupported_language(format!(
                "Plugin for {} not installed",
                language.name()
            ))
            .with_file(file_path)
        })
    }

    /// Parse one file into an owned tree.
    ///
    /// A tree with error nodes still succeeds; the error regions are
    /// reported in `diagnostics`. A grammar failure that yields no tree at
    /// all is a `Parse` error.
    pub fn parse(&self, file_path: &str, bytes: &[u8]) -> Result<ParsedTree> {
        let plugin = self.plugin_for_path(file_path)?;
        let source = String::from_utf8_lossy(bytes).into_owned();

        let mut parser = TSParser::new();
        parser
            .set_language(&plugin.tree_sitter_language())
            .map_err(|e| {
                CodeatlasError::parse(format!("Failed to set language: {}", e)).with_file(file_path)
            })?;

        let tree = parser.parse(source.as_bytes(), None).ok_or_else(|| {
            CodeatlasError::parse("Parser produced no tree").with_file(file_path)
        })?;

        let root = convert_node(plugin.as_ref(), &tree.root_node(), None);
        let mut diagnostics = Vec::new();
        collect_diagnostics(&tree.root_node(), &mut diagnostics);

        Ok(ParsedTree::new(
            root,
            source,
            file_path.to_string(),
            plugin.language_id().name().to_string(),
        )
        .with_diagnostics(diagnostics))
    }
}

/// Convert a tree-sitter node into the owned model, keeping grammar field
/// names so extraction hooks can navigate by field.
fn convert_node(
    plugin: &dyn LanguagePlugin,
    node: &tree_sitter::Node,
    field: Option<&str>,
) -> SyntaxNode {
    let mut converted = SyntaxNode::new(
        plugin.map_syntax_kind(node.kind()),
        node.kind(),
        Span::from_ts_node(node),
    );
    converted.field = field.map(|f| f.to_string());
    converted.is_named = node.is_named();
    converted.children = (0..node.child_count())
        .filter_map(|i| {
            let child = node.child(i)?;
            if child.is_extra() && !child.is_error() {
                // Comments and whitespace-only extras are dropped from the
                // structural tree; spans keep the bytes reconstructible
                return None;
            }
            let field_name = node.field_name_for_child(i as u32);
            Some(convert_node(plugin, &child, field_name))
        })
        .collect();
    converted
}

fn collect_diagnostics(node: &tree_sitter::Node, diagnostics: &mut Vec<ParseDiagnostic>) {
    if node.is_error() || node.is_missing() {
        diagnostics.push(ParseDiagnostic {
            message: if node.is_missing() {
                format!("Missing {}", node.kind())
            } else {
                format!("Syntax error near byte {}", node.start_byte())
            },
            span: Span::from_ts_node(node),
        });
        // Do not descend into error subtrees; one diagnostic per region
        return;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            collect_diagnostics(&child, diagnostics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::parsing::domain::SyntaxKind;
    use crate::shared::models::ErrorKind;

    #[test]
    fn test_parse_python_function() {
        let registry = ParserRegistry::with_default_plugins();
        let tree = registry
            .parse("test.py", b"def hello():\n    pass\n")
            .unwrap();

        assert_eq!(tree.language, "python");
        assert!(!tree.has_errors());
        assert!(tree
            .root
            .children
            .iter()
            .any(|c| c.kind == SyntaxKind::FunctionDef));
    }

    #[test]
    fn test_parse_python_class_with_spans() {
        let registry = ParserRegistry::with_default_plugins();
        let source = b"class Foo:\n    def bar(self):\n        pass\n";
        let tree = registry.parse("test.py", source).unwrap();

        let class = tree
            .root
            .children
            .iter()
            .find(|c| c.kind == SyntaxKind::ClassDef)
            .unwrap();
        assert_eq!(class.span.start_byte, 0);
        assert!(class.text(&tree.source).starts_with("class Foo"));

        let name = class.child_by_field("name").unwrap();
        assert_eq!(name.text(&tree.source), "Foo");
    }

    #[test]
    fn test_partial_parse_keeps_tree() {
        let registry = ParserRegistry::with_default_plugins();
        let tree = registry
            .parse("broken.py", b"def broken(:\n    pass\n\ndef ok():\n    pass\n")
            .unwrap();

        // Best-effort tree with diagnostics on the broken region
        assert!(tree.has_errors());
        assert!(tree.root.subtree_size() > 1);
    }

    #[test]
    fn test_unknown_extension_skipped() {
        let registry = ParserRegistry::with_default_plugins();
        let err = registry.parse("README.md", b"# hi").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnsupportedLanguage);
    }

    #[test]
    fn test_extension_override() {
        let registry =
            ParserRegistry::with_default_plugins().with_override("pyx", LanguageId::Python);
        assert_eq!(registry.language_for("fast.pyx"), Some(LanguageId::Python));
    }

    #[test]
    fn test_parse_java() {
        let registry = ParserRegistry::with_default_plugins();
        let tree = registry
            .parse(
                "Outer.java",
                b"package com.example; class Outer { class Inner { int value; } }",
            )
            .unwrap();
        assert_eq!(tree.language, "java");
        assert!(!tree.has_errors());
    }

    #[test]
    fn test_parse_typescript() {
        let registry = ParserRegistry::with_default_plugins();
        let tree = registry
            .parse("app.ts", b"export function greet(name: string): string { return name; }")
            .unwrap();
        assert_eq!(tree.language, "typescript");
        assert!(tree
            .root
            .children
            .iter()
            .any(|c| c.raw_kind == "export_statement" || c.kind == SyntaxKind::FunctionDef));
    }
}
