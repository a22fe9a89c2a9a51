//! Semantic IR: attach CFG/DFG layers to structural IR

mod builder;

pub use builder::SemanticIrBuilder;
