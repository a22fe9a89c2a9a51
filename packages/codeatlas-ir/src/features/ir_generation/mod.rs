//! IR generation: syntax tree to language-neutral IR

pub mod domain;
pub mod infrastructure;

pub use domain::{ControlFlowSummary, FunctionSemanticIr, IRDocument, IrDiagnostic};
pub use infrastructure::IrGenerator;
