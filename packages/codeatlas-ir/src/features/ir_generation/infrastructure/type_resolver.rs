//! Type annotation resolution
//!
//! Turns textual annotations into `TypeEntity` records: flavor
//! classification, nullability, and generic parameter lifting. Resolution
//! to user-defined nodes is file-local here; cross-file targets stay
//! unresolved for the graph builder.

use std::collections::HashMap;

use crate::shared::models::{TypeEntity, TypeFlavor};

const PRIMITIVES: &[&str] = &[
    "int", "float", "bool", "str", "bytes", "complex", "char", "byte", "short", "long", "double",
    "boolean", "void", "unit", "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f32", "f64",
    "usize", "isize", "number", "string", "boolean", "null", "undefined", "rune", "uint",
];

const BUILTINS: &[&str] = &[
    "list", "dict", "set", "tuple", "frozenset", "List", "Dict", "Set", "Tuple", "Optional",
    "Union", "Any", "Callable", "Iterator", "Iterable", "Sequence", "Mapping", "Array", "Map",
    "Promise", "Vec", "Option", "Result", "Box", "String", "HashMap", "HashSet", "ArrayList",
    "Object", "Integer", "Long", "Double", "Boolean",
];

/// Resolves annotations within one file
pub struct TypeResolver {
    repo_id: String,
    /// Locally declared classes: simple name → node id
    local_types: HashMap<String, String>,
    /// Cache of resolved annotations: raw text → entity id
    cache: HashMap<String, String>,
    entities: Vec<TypeEntity>,
}

impl TypeResolver {
    pub fn new(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            local_types: HashMap::new(),
            cache: HashMap::new(),
            entities: Vec::new(),
        }
    }

    /// Register a class/interface/enum declared in this file
    pub fn register_local_type(&mut self, name: impl Into<String>, node_id: impl Into<String>) {
        self.local_types.insert(name.into(), node_id.into());
    }

    /// Resolve an annotation to a TypeEntity id, creating the entity (and
    /// its generic parameter entities) on first sight.
    pub fn resolve(&mut self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(id) = self.cache.get(raw) {
            return Some(id.clone());
        }

        let (base, generic_args) = split_generic(raw);
        let is_nullable = is_nullable_annotation(raw, &base);

        // Generic parameters become their own entities, resolved recursively
        let generic_param_ids: Vec<String> = generic_args
            .iter()
            .filter_map(|arg| self.resolve(arg))
            .collect();

        let flavor = self.classify(&base, !generic_args.is_empty());
        let mut entity = TypeEntity::new(&self.repo_id, raw, flavor).with_nullable(is_nullable);
        entity.generic_param_ids = generic_param_ids;
        if let Some(node_id) = self.local_types.get(base.as_str()) {
            entity = entity.with_resolved_target(node_id.clone());
        }

        let id = entity.id.clone();
        self.cache.insert(raw.to_string(), id.clone());
        self.entities.push(entity);
        Some(id)
    }

    fn classify(&self, base: &str, has_generics: bool) -> TypeFlavor {
        if self.local_types.contains_key(base) {
            return TypeFlavor::User;
        }
        if PRIMITIVES.contains(&base) {
            return TypeFlavor::Primitive;
        }
        if BUILTINS.contains(&base) {
            return TypeFlavor::Builtin;
        }
        // Single uppercase letters are conventionally type variables
        if base.len() <= 2 && base.chars().all(|c| c.is_ascii_uppercase()) {
            return TypeFlavor::TypeVar;
        }
        if has_generics {
            return TypeFlavor::Generic;
        }
        TypeFlavor::External
    }

    /// Drain accumulated entities
    pub fn take_entities(&mut self) -> Vec<TypeEntity> {
        std::mem::take(&mut self.entities)
    }
}

/// Split "List[int]" / "Map<String, User>" into base + arguments
fn split_generic(raw: &str) -> (String, Vec<String>) {
    let open = raw.find(['[', '<']);
    let Some(open_idx) = open else {
        return (raw.trim_end_matches('?').to_string(), Vec::new());
    };
    let base = raw[..open_idx].trim().to_string();
    let close_idx = raw.rfind([']', '>']).unwrap_or(raw.len());
    let inner = &raw[open_idx + 1..close_idx.max(open_idx + 1)];

    // Split on top-level commas only
    let mut args = Vec::new();
    let mut depth = 0u32;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '[' | '<' => depth += 1,
            ']' | '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(inner[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < inner.len() {
        args.push(inner[start..].trim().to_string());
    }
    args.retain(|a| !a.is_empty());
    (base, args)
}

fn is_nullable_annotation(raw: &str, base: &str) -> bool {
    raw.ends_with('?') || base == "Optional" || raw.starts_with("Optional[")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_classification() {
        let mut resolver = TypeResolver::new("repo");
        resolver.resolve("int");
        let entities = resolver.take_entities();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].flavor, TypeFlavor::Primitive);
    }

    #[test]
    fn test_generic_lifting() {
        let mut resolver = TypeResolver::new("repo");
        resolver.resolve("Dict[str, int]");
        let entities = resolver.take_entities();
        // str, int, and the Dict itself
        assert_eq!(entities.len(), 3);
        let dict = entities.iter().find(|e| e.raw == "Dict[str, int]").unwrap();
        assert_eq!(dict.generic_param_ids.len(), 2);
        assert_eq!(dict.flavor, TypeFlavor::Builtin);
    }

    #[test]
    fn test_nested_generic_split() {
        let (base, args) = split_generic("Map<String, List<User>>");
        assert_eq!(base, "Map");
        assert_eq!(args, vec!["String", "List<User>"]);
    }

    #[test]
    fn test_local_type_resolution() {
        let mut resolver = TypeResolver::new("repo");
        resolver.register_local_type("Calculator", "node123");
        resolver.resolve("Calculator");
        let entities = resolver.take_entities();
        assert_eq!(entities[0].flavor, TypeFlavor::User);
        assert_eq!(entities[0].resolved_target.as_deref(), Some("node123"));
    }

    #[test]
    fn test_nullable_detection() {
        let mut resolver = TypeResolver::new("repo");
        resolver.resolve("Optional[str]");
        resolver.resolve("String?");
        let entities = resolver.take_entities();
        assert!(entities.iter().find(|e| e.raw == "Optional[str]").unwrap().is_nullable);
        assert!(entities.iter().find(|e| e.raw == "String?").unwrap().is_nullable);
    }

    #[test]
    fn test_annotation_cache_dedupes() {
        let mut resolver = TypeResolver::new("repo");
        let a = resolver.resolve("int").unwrap();
        let b = resolver.resolve("int").unwrap();
        assert_eq!(a, b);
        assert_eq!(resolver.take_entities().len(), 1);
    }
}
