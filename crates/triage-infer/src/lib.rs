//! CivicTriage Infer: complaint risk scoring.
//!
//! A risk score is a pure function of the complaint text, the affected
//! population and three loaded models: a sentence embedder, a fitted feature
//! scaler and a tree-ensemble regressor. When the `onnx` feature is enabled
//! and model files are present, `OnnxEmbedder` loads all-MiniLM-L6-v2 for
//! 384-dim embeddings. Without it `NoopEmbedder` is used and scoring fails.

pub mod cache;
pub mod embedder;
pub mod onnx_embedder;
pub mod regressor;
pub mod scaler;
pub mod scorer;

pub use cache::EmbeddingCache;
pub use embedder::{EmbedderBackend, EmbeddingResult, NoopEmbedder};
pub use regressor::{RiskRegressor, TreeEnsemble};
pub use scaler::{FeatureScaler, IdentityScaler, StandardScaler};
pub use scorer::RiskScorer;

#[cfg(feature = "onnx")]
pub use onnx_embedder::OnnxEmbedder;

use std::path::Path;
use std::sync::Arc;

/// Create the best available embedder for the given model directory.
///
/// Tries ONNX first (if the feature is enabled and model files are present),
/// falls back to `NoopEmbedder`.
pub fn create_embedder(model_dir: &Path, dim: usize) -> Arc<dyn EmbedderBackend> {
    #[cfg(feature = "onnx")]
    {
        match OnnxEmbedder::load(model_dir) {
            Ok(embedder) => {
                tracing::info!("Using ONNX embedder (dim={})", embedder.dimension());
                return Arc::new(embedder);
            }
            Err(e) => {
                tracing::warn!("ONNX embedder unavailable: {}. Complaints cannot be scored.", e);
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    {
        let _ = model_dir;
        tracing::warn!("ONNX feature disabled. Complaints cannot be scored.");
    }

    Arc::new(NoopEmbedder::new(dim))
}
