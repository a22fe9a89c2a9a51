//! Type, signature, and variable entities
//!
//! These are first-class entities referenced from nodes by id, not node
//! subclasses. `SignatureEntity.signature_hash` is the interface-change
//! detector: a pure function of the semantic signature fields only, so a
//! body edit never changes it and a parameter/return/visibility edit
//! always does.

use serde::{Deserialize, Serialize};

use crate::shared::utils::hash::id_hash;

/// Type flavor classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeFlavor {
    Primitive,
    Builtin,
    User,
    External,
    TypeVar,
    Generic,
}

/// A type as written or inferred
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeEntity {
    pub id: String,
    /// The textual type as written (e.g. "List[int]", "Map<String, User>")
    pub raw: String,
    /// Node id for user-defined types; None for primitive/external
    pub resolved_target: Option<String>,
    pub flavor: TypeFlavor,
    pub is_nullable: bool,
    /// Ordered generic parameters, as TypeEntity ids
    pub generic_param_ids: Vec<String>,
}

impl TypeEntity {
    /// Type ids are keyed by repo + raw text so identical annotations share
    /// one entity per document.
    pub fn compute_id(repo_id: &str, raw: &str) -> String {
        format!("type:{}", id_hash(&format!("{}:{}", repo_id, raw)))
    }

    pub fn new(repo_id: &str, raw: impl Into<String>, flavor: TypeFlavor) -> Self {
        let raw = raw.into();
        Self {
            id: Self::compute_id(repo_id, &raw),
            raw,
            resolved_target: None,
            flavor,
            is_nullable: false,
            generic_param_ids: Vec::new(),
        }
    }

    pub fn with_resolved_target(mut self, node_id: impl Into<String>) -> Self {
        self.resolved_target = Some(node_id.into());
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.is_nullable = nullable;
        self
    }
}

/// Visibility of a function-like declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Private,
    Internal,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
            Visibility::Internal => "internal",
        }
    }
}

/// Function/method signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureEntity {
    pub id: String,
    pub owner_node_id: String,
    pub name: String,
    /// Formatted signature, e.g. "add(self, x: int, y: int) -> int"
    pub raw: String,
    /// Ordered parameter TypeEntity ids
    pub parameter_type_ids: Vec<String>,
    pub return_type_id: Option<String>,
    pub visibility: Visibility,
    pub is_async: bool,
    pub is_static: bool,
    pub throws_type_ids: Vec<String>,
    /// Stable hash of the semantic fields; see [`signature_hash`]
    pub signature_hash: String,
}

/// Compute the interface hash from semantic fields only.
///
/// Inputs are the *raw* type texts (not entity ids) so the hash survives
/// re-indexing even though TypeEntity ids may be rebuilt, and changes
/// exactly when the externally visible interface changes.
pub fn signature_hash(
    parameter_type_raws: &[String],
    return_type_raw: Option<&str>,
    visibility: Visibility,
    is_async: bool,
    is_static: bool,
    throws_type_raws: &[String],
) -> String {
    let key = format!(
        "{}|{}|{}|{}|{}|{}",
        parameter_type_raws.join(","),
        return_type_raw.unwrap_or(""),
        visibility.as_str(),
        is_async,
        is_static,
        throws_type_raws.join(",")
    );
    id_hash(&key)
}

impl SignatureEntity {
    pub fn compute_id(owner_node_id: &str) -> String {
        format!("sig:{}", owner_node_id)
    }
}

/// A variable occurrence in the semantic IR (DFG layer)
///
/// Id format: `var:{repo_id}:{file_path}:{func_fqn}:{name}@{block_idx}:{shadow_cnt}`.
/// The shadow count disambiguates re-declarations within one function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableEntity {
    pub id: String,
    pub name: String,
    pub function_node_id: String,
    pub block_idx: usize,
    pub shadow_cnt: u32,
    pub declared_type_id: Option<String>,
}

impl VariableEntity {
    pub fn compute_id(
        repo_id: &str,
        file_path: &str,
        func_fqn: &str,
        name: &str,
        block_idx: usize,
        shadow_cnt: u32,
    ) -> String {
        format!(
            "var:{}:{}:{}:{}@{}:{}",
            repo_id, file_path, func_fqn, name, block_idx, shadow_cnt
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_entity_shared_id() {
        let a = TypeEntity::new("repo", "int", TypeFlavor::Primitive);
        let b = TypeEntity::new("repo", "int", TypeFlavor::Primitive);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_signature_hash_ignores_body() {
        // Two calls with identical semantic fields produce the same hash;
        // there is no body input at all.
        let h1 = signature_hash(
            &["int".into()],
            Some("int"),
            Visibility::Public,
            false,
            false,
            &[],
        );
        let h2 = signature_hash(
            &["int".into()],
            Some("int"),
            Visibility::Public,
            false,
            false,
            &[],
        );
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_signature_hash_detects_parameter_change() {
        let old = signature_hash(
            &["int".into()],
            Some("int"),
            Visibility::Public,
            false,
            false,
            &[],
        );
        let new = signature_hash(
            &["int".into(), "int".into()],
            Some("int"),
            Visibility::Public,
            false,
            false,
            &[],
        );
        assert_ne!(old, new);
    }

    #[test]
    fn test_signature_hash_detects_visibility_change() {
        let pub_hash = signature_hash(&[], None, Visibility::Public, false, false, &[]);
        let priv_hash = signature_hash(&[], None, Visibility::Private, false, false, &[]);
        assert_ne!(pub_hash, priv_hash);
    }

    #[test]
    fn test_variable_entity_id_format() {
        let id = VariableEntity::compute_id("repo", "a.py", "a.foo", "x", 2, 1);
        assert_eq!(id, "var:repo:a.py:a.foo:x@2:1");
    }
}
