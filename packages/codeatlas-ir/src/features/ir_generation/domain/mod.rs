//! IR generation domain models

mod control_flow_summary;
mod ir_document;

pub use control_flow_summary::ControlFlowSummary;
pub use ir_document::{FunctionSemanticIr, IRDocument, IrDiagnostic, SCHEMA_VERSION};
