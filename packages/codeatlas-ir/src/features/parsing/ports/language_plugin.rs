//! Language plugin port
//!
//! Each supported language implements this trait: grammar selection, node
//! kind mapping, and a small capability set of hooks the shared IR
//! extractor calls where languages genuinely differ (module paths, base
//! classes, parameters, visibility). The hooks have working defaults so a
//! minimal plugin only supplies the grammar and the kind mapping.

use tree_sitter::Language as TSLanguage;

use crate::features::parsing::domain::{SyntaxKind, SyntaxNode};
use crate::shared::models::{Span, Visibility};

/// Language identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageId {
    Python,
    TypeScript,
    JavaScript,
    Java,
    Go,
    Rust,
    C,
    Cpp,
    Kotlin,
}

impl LanguageId {
    pub fn name(&self) -> &'static str {
        match self {
            LanguageId::Python => "python",
            LanguageId::TypeScript => "typescript",
            LanguageId::JavaScript => "javascript",
            LanguageId::Java => "java",
            LanguageId::Go => "go",
            LanguageId::Rust => "rust",
            LanguageId::C => "c",
            LanguageId::Cpp => "cpp",
            LanguageId::Kotlin => "kotlin",
        }
    }

    /// Fixed extension table (callers may override via the registry)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "py" | "pyi" => Some(LanguageId::Python),
            "ts" | "tsx" => Some(LanguageId::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(LanguageId::JavaScript),
            "java" => Some(LanguageId::Java),
            "go" => Some(LanguageId::Go),
            "rs" => Some(LanguageId::Rust),
            "c" | "h" => Some(LanguageId::C),
            "cc" | "cpp" | "hpp" => Some(LanguageId::Cpp),
            "kt" | "kts" => Some(LanguageId::Kotlin),
            _ => None,
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            LanguageId::Python => &["py", "pyi"],
            LanguageId::TypeScript => &["ts", "tsx"],
            LanguageId::JavaScript => &["js", "jsx", "mjs", "cjs"],
            LanguageId::Java => &["java"],
            LanguageId::Go => &["go"],
            LanguageId::Rust => &["rs"],
            LanguageId::C => &["c", "h"],
            LanguageId::Cpp => &["cc", "cpp", "hpp"],
            LanguageId::Kotlin => &["kt", "kts"],
        }
    }
}

/// A parameter extracted from a function-like declaration
#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub name: String,
    pub type_annotation: Option<String>,
    pub span: Span,
}

/// A base-class or interface reference on a class declaration
#[derive(Debug, Clone)]
pub struct HeritageInfo {
    pub name: String,
    /// `implements` relation (vs. `extends`)
    pub is_interface: bool,
    pub span: Span,
}

/// A single imported binding
#[derive(Debug, Clone)]
pub struct ImportInfo {
    /// Module path as written (e.g. "os.path", "com.example.util")
    pub module: String,
    /// Specific imported name for `from x import y` style; None for whole-module imports
    pub name: Option<String>,
    pub alias: Option<String>,
    pub is_from_import: bool,
    pub span: Span,
}

impl ImportInfo {
    /// FQN the binding resolves to: `module.name` or just `module`
    pub fn imported_fqn(&self) -> String {
        match &self.name {
            Some(name) => format!("{}.{}", self.module, name),
            None => self.module.clone(),
        }
    }

    /// Name the binding is visible under in the importing file
    pub fn local_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .module
                .rsplit('.')
                .next()
                .unwrap_or(&self.module)
                .to_string(),
        }
    }
}

/// Language plugin
pub trait LanguagePlugin: Send + Sync {
    fn language_id(&self) -> LanguageId;

    fn tree_sitter_language(&self) -> TSLanguage;

    /// Map a raw tree-sitter grammar kind to the normalized SyntaxKind
    fn map_syntax_kind(&self, raw_kind: &str) -> SyntaxKind;

    /// Dotted module path for a file.
    ///
    /// Default: file layout with separators replaced by dots and the
    /// extension dropped, `src/` prefix stripped (Python-style). Languages
    /// with explicit package declarations (Java, Kotlin, Go) override.
    fn module_path(&self, file_path: &str, _root: &SyntaxNode, _source: &str) -> Option<String> {
        module_path_from_layout(file_path)
    }

    /// Docstring / doc comment attached to a definition node
    fn docstring(&self, _def: &SyntaxNode, _source: &str) -> Option<String> {
        None
    }

    /// Declared name of a definition node
    fn definition_name<'a>(&self, def: &SyntaxNode, source: &'a str) -> Option<&'a str> {
        def.child_by_field("name").map(|n| n.text(source))
    }

    /// Parameters of a function-like node
    fn parameters(&self, def: &SyntaxNode, source: &str) -> Vec<ParamInfo> {
        let Some(params) = def.child_by_field("parameters") else {
            return Vec::new();
        };
        params
            .children
            .iter()
            .filter(|c| c.kind == SyntaxKind::ParameterDecl)
            .filter_map(|p| {
                let name = p
                    .child_by_field("name")
                    .map(|n| n.text(source))
                    .or_else(|| (p.raw_kind == "identifier").then(|| p.text(source)))
                    .or_else(|| {
                        p.children
                            .iter()
                            .find(|c| c.raw_kind == "identifier")
                            .map(|n| n.text(source))
                    })?;
                let type_annotation = p
                    .child_by_field("type")
                    .map(|t| t.text(source).trim_start_matches(':').trim().to_string());
                Some(ParamInfo {
                    name: name.to_string(),
                    type_annotation,
                    span: p.span,
                })
            })
            .collect()
    }

    /// Return type annotation of a function-like node
    fn return_type(&self, def: &SyntaxNode, source: &str) -> Option<String> {
        def.child_by_field("return_type")
            .map(|t| t.text(source).trim_start_matches("->").trim().to_string())
    }

    /// Base classes and implemented interfaces of a class-like node
    fn heritage(&self, _class: &SyntaxNode, _source: &str) -> Vec<HeritageInfo> {
        Vec::new()
    }

    /// Visibility of a definition node
    fn visibility(&self, _def: &SyntaxNode, _source: &str) -> Visibility {
        Visibility::Public
    }

    fn is_async(&self, def: &SyntaxNode, source: &str) -> bool {
        def.children
            .iter()
            .any(|c| c.raw_kind == "async" || c.text(source) == "async")
    }

    fn is_static(&self, _def: &SyntaxNode, _source: &str) -> bool {
        false
    }

    /// Imported bindings of an import declaration node.
    ///
    /// Default: treat the statement tail as one dotted module path. Precise
    /// alias handling is per-language.
    fn imports(&self, node: &SyntaxNode, source: &str) -> Vec<ImportInfo> {
        let text = node.text(source);
        let module = text
            .trim()
            .trim_start_matches("import")
            .trim_start_matches("use")
            .trim_start_matches("#include")
            .trim()
            .trim_end_matches(';')
            .trim_matches(|c| c == '"' || c == '<' || c == '>')
            .to_string();
        if module.is_empty() {
            return Vec::new();
        }
        vec![ImportInfo {
            module,
            name: None,
            alias: None,
            is_from_import: false,
            span: node.span,
        }]
    }

    /// Declared exception types of a function (`throws` clauses); empty for
    /// languages without checked exceptions
    fn throws_clause(&self, _def: &SyntaxNode, _source: &str) -> Vec<String> {
        Vec::new()
    }

    /// Whether a file is a test file (path heuristics shared; languages may
    /// add marker-based detection)
    fn is_test_file(&self, file_path: &str) -> bool {
        is_test_path(file_path)
    }
}

/// Shared path-layout module path: "src/a/b.py" → "a.b"
pub fn module_path_from_layout(file_path: &str) -> Option<String> {
    let path = file_path.strip_prefix("./").unwrap_or(file_path);
    let stem = path.rsplit_once('.').map(|(s, _)| s).unwrap_or(path);
    let trimmed = stem
        .strip_prefix("src/")
        .or_else(|| stem.strip_prefix("lib/"))
        .unwrap_or(stem);
    let dotted = trimmed.replace(['/', '\\'], ".");
    if dotted.is_empty() {
        None
    } else {
        Some(dotted)
    }
}

/// Shared path-based test detection
pub fn is_test_path(file_path: &str) -> bool {
    let lower = file_path.to_lowercase();
    let file_name = lower.rsplit('/').next().unwrap_or(&lower);
    lower.split('/').any(|seg| seg == "tests" || seg == "test" || seg == "__tests__")
        || file_name.starts_with("test_")
        || file_name.contains("_test.")
        || file_name.contains(".test.")
        || file_name.contains(".spec.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_table() {
        assert_eq!(LanguageId::from_extension("py"), Some(LanguageId::Python));
        assert_eq!(LanguageId::from_extension("tsx"), Some(LanguageId::TypeScript));
        assert_eq!(LanguageId::from_extension("jsx"), Some(LanguageId::JavaScript));
        assert_eq!(LanguageId::from_extension("h"), Some(LanguageId::C));
        assert_eq!(LanguageId::from_extension("hpp"), Some(LanguageId::Cpp));
        assert_eq!(LanguageId::from_extension("kt"), Some(LanguageId::Kotlin));
        assert_eq!(LanguageId::from_extension("txt"), None);
    }

    #[test]
    fn test_module_path_from_layout() {
        assert_eq!(module_path_from_layout("src/a/b.py").as_deref(), Some("a.b"));
        assert_eq!(module_path_from_layout("mypkg/calc.py").as_deref(), Some("mypkg.calc"));
        assert_eq!(module_path_from_layout("main.go").as_deref(), Some("main"));
    }

    #[test]
    fn test_is_test_path() {
        assert!(is_test_path("tests/test_calc.py"));
        assert!(is_test_path("src/foo/bar.spec.ts"));
        assert!(is_test_path("pkg/util_test.go"));
        assert!(!is_test_path("src/app/service.py"));
    }
}
