//! RepoMap: importance scoring and the navigable tree

pub mod domain;
pub mod infrastructure;

pub use domain::{RepoMap, RepoMapLevel, RepoMapNode};
pub use infrastructure::{assign_importance, PageRankEngine, PageRankSettings, RepoMapBuilder};
