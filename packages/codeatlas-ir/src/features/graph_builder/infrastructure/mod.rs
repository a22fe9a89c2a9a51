//! Graph builder infrastructure

mod builder;
mod cross_file_resolver;
mod entry_points;
mod role_tagger;

pub use builder::GraphBuilder;
pub use cross_file_resolver::CrossFileResolver;
pub use entry_points::detect_entry_points;
pub use role_tagger::{role_for_path, tag_roles};
