//! Runtime orchestrator: runs uploaded batches through the pipeline.
//!
//! Loads each file, extracts complaint fields, scores every item with the
//! shared [`ModelContext`], ranks the batch and optionally persists the
//! ranked results.

pub mod context;
pub mod orchestrator;
pub mod ranking;

pub use context::{ModelContext, ModelSummary};
pub use orchestrator::Orchestrator;
pub use ranking::assign_priority;
