//! Sentence embedding backends.
//!
//! - `OnnxEmbedder`: ONNX Runtime with all-MiniLM-L6-v2 (requires the `onnx` feature)
//! - `NoopEmbedder`: stands in when no model could be loaded; every call fails

use ndarray::Array1;
use triage_core::{Error, Result};

/// Result of an embedding operation.
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    /// Float32 embedding vector (384-dim for all-MiniLM-L6-v2).
    pub embedding: Array1<f32>,
    /// Whether this was served from cache.
    pub cached: bool,
}

/// Text → fixed-length vector.
pub trait EmbedderBackend: Send + Sync {
    fn embed(&self, text: &str) -> Result<EmbeddingResult>;

    /// Length of every vector this backend produces.
    fn dimension(&self) -> usize;

    /// Whether a model is loaded.
    fn is_available(&self) -> bool;
}

/// Embedder used when no model is available. Scoring fails loudly rather
/// than producing risk scores from meaningless features.
pub struct NoopEmbedder {
    dim: usize,
}

impl NoopEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl EmbedderBackend for NoopEmbedder {
    fn embed(&self, _text: &str) -> Result<EmbeddingResult> {
        Err(Error::Inference("no embedding model loaded".into()))
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        false
    }
}
