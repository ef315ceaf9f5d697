//! all-MiniLM-L6-v2 sentence embeddings through ONNX Runtime.
//!
//! Loads a SentenceTransformers ONNX export and its HuggingFace tokenizer,
//! mean-pools token embeddings over the attention mask and L2-normalizes the
//! result to a 384-dim vector. Requires the `onnx` feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;

    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::{debug, info};
    use triage_core::{Error, Result};

    use crate::cache::EmbeddingCache;
    use crate::embedder::{EmbedderBackend, EmbeddingResult};

    /// Longest token sequence the model accepts.
    const MAX_SEQ_LEN: usize = 256;

    const EMBEDDING_DIM: usize = 384;

    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        cache: EmbeddingCache,
        dimension: usize,
    }

    fn model_err(context: &str, e: impl std::fmt::Display) -> Error {
        Error::Inference(format!("{}: {}", context, e))
    }

    impl OnnxEmbedder {
        /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
        ///
        /// With `load-dynamic`, `ORT_DYLIB_PATH` must point at libonnxruntime.
        pub fn load(model_dir: &Path) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(Error::Config(format!("Model not found: {}", model_path.display())));
            }
            if !tokenizer_path.exists() {
                return Err(Error::Config(format!(
                    "Tokenizer not found: {}",
                    tokenizer_path.display()
                )));
            }

            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| model_err("session builder", e))?
                .with_intra_threads(2)
                .map_err(|e| model_err("thread config", e))?
                .commit_from_file(&model_path)
                .map_err(|e| model_err("loading ONNX model", e))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| model_err("loading tokenizer", e))?;

            info!(
                "ONNX embedder loaded: dim={}, model={}",
                EMBEDDING_DIM,
                model_path.display()
            );

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                cache: EmbeddingCache::default_cache(),
                dimension: EMBEDDING_DIM,
            })
        }

        fn infer(&self, text: &str) -> Result<Array1<f32>> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| model_err("tokenization", e))?;

            let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            let input_ids = &encoding.get_ids()[..seq_len];
            let attention_mask = &encoding.get_attention_mask()[..seq_len];

            let ids_data: Vec<i64> = input_ids.iter().map(|&id| id as i64).collect();
            let mask_data: Vec<i64> = attention_mask.iter().map(|&m| m as i64).collect();
            let type_ids_data: Vec<i64> = vec![0i64; seq_len];

            let ids_tensor = Tensor::from_array(([1usize, seq_len], ids_data))
                .map_err(|e| model_err("ids tensor", e))?;
            let mask_tensor = Tensor::from_array(([1usize, seq_len], mask_data))
                .map_err(|e| model_err("mask tensor", e))?;
            let type_ids_tensor = Tensor::from_array(([1usize, seq_len], type_ids_data))
                .map_err(|e| model_err("type_ids tensor", e))?;

            let mut session = self.session.lock();
            let outputs = session
                .run(ort::inputs![ids_tensor, mask_tensor, type_ids_tensor])
                .map_err(|e| model_err("ONNX inference", e))?;

            // Either token embeddings [1, seq_len, dim] or a pooled [1, dim].
            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| model_err("reading output tensor", e))?;
            let dims: Vec<i64> = shape.iter().copied().collect();

            let pooled = match dims.as_slice() {
                [1, _, dim] => mean_pool(data, attention_mask, *dim as usize)?,
                [1, dim] => Array1::from_vec(data[..*dim as usize].to_vec()),
                other => {
                    return Err(Error::Inference(format!(
                        "unexpected embedding output shape {:?}",
                        other
                    )))
                }
            };
            Ok(l2_normalize(pooled))
        }
    }

    /// Attention-masked mean over `[seq_len][dim]` token vectors.
    fn mean_pool(data: &[f32], mask: &[u32], dim: usize) -> Result<Array1<f32>> {
        let mask_sum: f32 = mask.iter().map(|&m| m as f32).sum();
        if mask_sum < 1e-9 {
            return Err(Error::Inference("empty attention mask".into()));
        }
        let mut pooled = Array1::<f32>::zeros(dim);
        for (i, &m) in mask.iter().enumerate() {
            if m == 0 {
                continue;
            }
            let row = &data[i * dim..(i + 1) * dim];
            for (d, v) in row.iter().enumerate() {
                pooled[d] += v;
            }
        }
        Ok(pooled / mask_sum)
    }

    fn l2_normalize(v: Array1<f32>) -> Array1<f32> {
        let norm = v.dot(&v).sqrt();
        if norm > 1e-12 {
            v / norm
        } else {
            v
        }
    }

    impl EmbedderBackend for OnnxEmbedder {
        fn embed(&self, text: &str) -> Result<EmbeddingResult> {
            if let Some(embedding) = self.cache.get(text) {
                debug!("Embedding cache hit ({} chars)", text.len());
                return Ok(EmbeddingResult {
                    embedding,
                    cached: true,
                });
            }

            let embedding = self.infer(text)?;
            self.cache.put(text.to_string(), embedding.clone());
            Ok(EmbeddingResult {
                embedding,
                cached: false,
            })
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn is_available(&self) -> bool {
            true
        }
    }

}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;
