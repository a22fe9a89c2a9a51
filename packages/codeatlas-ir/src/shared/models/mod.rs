//! Shared models

mod edge;
mod error;
mod node;
mod span;
pub mod type_entities;

pub use edge::{Edge, EdgeAttrs, EdgeKind};
pub use error::{CodeatlasError, ErrorKind, Result};
pub use node::{Node, NodeKind, NodeRole};
pub use span::{Location, Span};
pub use type_entities::{
    signature_hash, SignatureEntity, TypeEntity, TypeFlavor, VariableEntity, Visibility,
};

/// Node identifier type alias
pub type NodeId = String;
