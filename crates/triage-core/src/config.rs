//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Paths to all CivicTriage data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Per-upload temporary files (`data/staging/`).
    pub staging: PathBuf,
    /// Model artifacts (`data/models/`).
    pub models: PathBuf,
    /// SQLite database directory (`data/db/`).
    pub db: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            staging: root.join("staging"),
            models: root.join("models"),
            db: root.join("db"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.staging)?;
        std::fs::create_dir_all(&self.models)?;
        std::fs::create_dir_all(&self.db)?;
        Ok(())
    }

    /// Sentence-embedding model directory (`model.onnx` + `tokenizer.json`).
    pub fn embedder_dir(&self) -> PathBuf {
        self.models.join("embedder")
    }

    /// Pre-fit feature scaler (`feature_scaler.json`).
    pub fn scaler_file(&self) -> PathBuf {
        self.models.join("feature_scaler.json")
    }

    /// Trained risk regressor (`risk_model.json`, XGBoost JSON format).
    pub fn risk_model_file(&self) -> PathBuf {
        self.models.join("risk_model.json")
    }
}

/// Top-level CivicTriage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Embedding dimension (384 for all-MiniLM-L6-v2).
    pub embedding_dim: usize,
    /// Upper bound for rasterizing and OCR-ing one scanned PDF.
    pub ocr_timeout: Duration,
    /// Upper bound for processing one uploaded batch.
    pub batch_timeout: Duration,
    /// Whether ranked results are written to the complaint store.
    pub persist_results: bool,
    /// Optional newline-separated list of place names for entity recognition.
    pub gazetteer: Option<PathBuf>,
}

impl TriageConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let data_paths = DataPaths::new(data_dir)?;

        let persist_results = std::env::var("CIVICTRIAGE_PERSIST")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        let gazetteer = std::env::var("CIVICTRIAGE_GAZETTEER")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            port,
            data_paths,
            embedding_dim: 384,
            ocr_timeout: env_secs("CIVICTRIAGE_OCR_TIMEOUT_SECS", 120),
            batch_timeout: env_secs("CIVICTRIAGE_BATCH_TIMEOUT_SECS", 300),
            persist_results,
            gazetteer,
        })
    }
}

fn env_secs(key: &str, default: u64) -> Duration {
    let secs = std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_created() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path().join("data")).unwrap();
        assert!(paths.staging.is_dir());
        assert!(paths.models.is_dir());
        assert!(paths.db.is_dir());
        assert!(paths.risk_model_file().ends_with("models/risk_model.json"));
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("off"));
        assert!(!parse_flag(" FALSE "));
    }
}
