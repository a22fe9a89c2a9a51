//! Data flow infrastructure

mod dfg_builder;

pub use dfg_builder::DfgBuilder;
