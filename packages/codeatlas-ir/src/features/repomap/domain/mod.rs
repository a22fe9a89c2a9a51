//! RepoMap domain models

mod models;

pub use models::{RepoMap, RepoMapLevel, RepoMapNode};
