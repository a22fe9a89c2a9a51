//! Shared kernel: models and utilities used by every feature

pub mod models;
pub mod utils;
