//! Graph builder: per-file IR merged into the repository-wide graph

pub mod domain;
pub mod infrastructure;

pub use domain::{GraphDocument, GraphIndex, GraphStats};
pub use infrastructure::GraphBuilder;
