//! Shared application state.

use std::sync::Arc;

use triage_core::TriageConfig;
use triage_runtime::{ModelContext, Orchestrator};
use triage_store::SqliteStore;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: TriageConfig,
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<SqliteStore>,
}

impl AppState {
    /// Wire the pipeline to the store. Ranked results are persisted only
    /// when `config.persist_results` is set.
    pub fn new(config: TriageConfig, models: Arc<ModelContext>, store: Arc<SqliteStore>) -> Self {
        let mut orchestrator =
            Orchestrator::new(models).with_staging_dir(config.data_paths.staging.clone());
        if config.persist_results {
            orchestrator = orchestrator.with_sink(store.clone());
        }
        Self {
            config,
            orchestrator: Arc::new(orchestrator),
            store,
        }
    }
}
