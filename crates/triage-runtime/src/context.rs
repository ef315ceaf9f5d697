//! Model context: every loaded model and collaborator a batch needs.
//!
//! Built once at startup, immutable afterwards and shared via `Arc`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use triage_core::{Error, Result, TriageConfig};
use triage_infer::{create_embedder, FeatureScaler, RiskScorer, StandardScaler, TreeEnsemble};
use triage_ingest::{EntityRecognizer, HeuristicRecognizer, OcrEngine, PopplerTesseract};

/// Loaded models plus the OCR and NER adapters.
#[derive(Clone)]
pub struct ModelContext {
    pub scorer: RiskScorer,
    pub recognizer: Arc<dyn EntityRecognizer>,
    pub ocr: Arc<dyn OcrEngine>,
}

/// What the health endpoint reports about loaded models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub embedder_available: bool,
    pub feature_width: usize,
}

impl ModelContext {
    pub fn new(
        scorer: RiskScorer,
        recognizer: Arc<dyn EntityRecognizer>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            scorer,
            recognizer,
            ocr,
        }
    }

    /// Load the default adapters from the configured model directory.
    ///
    /// A missing or malformed scaler or risk model is fatal. A missing
    /// embedder is not: the context loads, and every scoring call fails.
    pub fn load(config: &TriageConfig) -> Result<Self> {
        let paths = &config.data_paths;
        let embedder = create_embedder(&paths.embedder_dir(), config.embedding_dim);
        let width = embedder.dimension() + 1;

        let scaler = StandardScaler::load(&paths.scaler_file())
            .map_err(|e| Error::Config(format!("feature scaler: {}", e)))?;
        if let Some(scaler_width) = scaler.width() {
            if scaler_width != width {
                return Err(Error::Config(format!(
                    "feature scaler expects {} features, embedder produces {}",
                    scaler_width, width
                )));
            }
        }

        let regressor = TreeEnsemble::load(&paths.risk_model_file())
            .map_err(|e| Error::Config(format!("risk model: {}", e)))?;
        if regressor.num_features() != width {
            return Err(Error::Config(format!(
                "risk model expects {} features, embedder produces {}",
                regressor.num_features(),
                width
            )));
        }

        let recognizer = match &config.gazetteer {
            Some(path) => HeuristicRecognizer::load_gazetteer(path)?,
            None => HeuristicRecognizer::new(),
        };
        let ocr = PopplerTesseract::new(config.ocr_timeout);

        let scorer = RiskScorer::new(embedder, Arc::new(scaler), Arc::new(regressor));
        info!(
            "Model context loaded: feature_width={}, embedder_available={}",
            scorer.feature_width(),
            scorer.embedder_available()
        );
        Ok(Self::new(scorer, Arc::new(recognizer), Arc::new(ocr)))
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            embedder_available: self.scorer.embedder_available(),
            feature_width: self.scorer.feature_width(),
        }
    }
}
