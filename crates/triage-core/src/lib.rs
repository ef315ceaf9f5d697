//! CivicTriage Core: complaint model, error taxonomy, configuration.

pub mod complaint;
pub mod config;
pub mod error;

pub use complaint::*;
pub use config::{DataPaths, TriageConfig};
pub use error::{Error, Result};
