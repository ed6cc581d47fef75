//! Plugin implementations
//!
//! Each plugin implements the core traits for one diagram type; the
//! orchestrator wires them into a pipeline.

pub mod orchestrator;
pub mod sequence;

pub use orchestrator::*;
pub use sequence::*;
