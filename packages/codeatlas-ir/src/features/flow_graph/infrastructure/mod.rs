//! Flow graph infrastructure

mod cfg_builder;

pub use cfg_builder::{CfgBuilder, LoweredFunction};
