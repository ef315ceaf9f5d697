//! Pre-fit feature scaling applied before regression.

use std::path::Path;

use ndarray::Array1;
use serde::Deserialize;
use tracing::info;
use triage_core::{Error, Result};

pub trait FeatureScaler: Send + Sync {
    fn transform(&self, features: Array1<f64>) -> Result<Array1<f64>>;

    /// Expected input width, if fixed.
    fn width(&self) -> Option<usize>;
}

/// Standardization with a fitted per-feature mean and scale:
/// `(x - mean) / scale`.
///
/// Loaded from `{"mean": [...], "scale": [...]}`, as exported from a fitted
/// scikit-learn `StandardScaler` (`mean_`, `scale_`).
#[derive(Debug, Clone)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

#[derive(Deserialize)]
struct ScalerFile {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        if mean.is_empty() {
            return Err(Error::Config("scaler has no features".into()));
        }
        if mean.len() != scale.len() {
            return Err(Error::Config(format!(
                "scaler mean has {} entries but scale has {}",
                mean.len(),
                scale.len()
            )));
        }
        if mean.iter().chain(scale.iter()).any(|v| !v.is_finite()) {
            return Err(Error::Config("scaler parameters must be finite".into()));
        }
        // Constant features carry scale 0; leave them centred but unscaled.
        let scale = scale
            .into_iter()
            .map(|s| if s == 0.0 { 1.0 } else { s })
            .collect();
        Ok(Self {
            mean: Array1::from_vec(mean),
            scale: Array1::from_vec(scale),
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let file: ScalerFile = serde_json::from_str(json)?;
        Self::new(file.mean, file.scale)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let scaler = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!(
            "Feature scaler loaded: {} features from {}",
            scaler.mean.len(),
            path.display()
        );
        Ok(scaler)
    }
}

impl FeatureScaler for StandardScaler {
    fn transform(&self, features: Array1<f64>) -> Result<Array1<f64>> {
        if features.len() != self.mean.len() {
            return Err(Error::Inference(format!(
                "feature width mismatch: scaler expects {}, got {}",
                self.mean.len(),
                features.len()
            )));
        }
        Ok((features - &self.mean) / &self.scale)
    }

    fn width(&self) -> Option<usize> {
        Some(self.mean.len())
    }
}

/// Pass-through scaler.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityScaler;

impl FeatureScaler for IdentityScaler {
    fn transform(&self, features: Array1<f64>) -> Result<Array1<f64>> {
        Ok(features)
    }

    fn width(&self) -> Option<usize> {
        None
    }
}
