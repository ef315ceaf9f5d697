//! Complaint risk scoring.
//!
//! Features are the complaint's sentence embedding followed by
//! `ln(1 + population)`. They are standardized with the pre-fit scaler and
//! fed to the regressor. The severity band is read off the raw prediction;
//! only the reported score is rounded to two decimals.

use std::sync::Arc;

use ndarray::Array1;
use tracing::debug;
use triage_core::{Error, Result, RiskAssessment, Severity};

use crate::embedder::EmbedderBackend;
use crate::regressor::RiskRegressor;
use crate::scaler::FeatureScaler;

/// Embedding + scaler + regressor.
#[derive(Clone)]
pub struct RiskScorer {
    embedder: Arc<dyn EmbedderBackend>,
    scaler: Arc<dyn FeatureScaler>,
    regressor: Arc<dyn RiskRegressor>,
}

impl RiskScorer {
    pub fn new(
        embedder: Arc<dyn EmbedderBackend>,
        scaler: Arc<dyn FeatureScaler>,
        regressor: Arc<dyn RiskRegressor>,
    ) -> Self {
        Self {
            embedder,
            scaler,
            regressor,
        }
    }

    /// Width of the feature vector this scorer builds.
    pub fn feature_width(&self) -> usize {
        self.embedder.dimension() + 1
    }

    pub fn embedder_available(&self) -> bool {
        self.embedder.is_available()
    }

    /// Unscaled feature vector: embedding ⊕ ln(1 + population).
    pub fn features(&self, complaint: &str, population: u64) -> Result<Array1<f64>> {
        let result = self.embedder.embed(complaint)?;
        if result.embedding.len() != self.embedder.dimension() {
            return Err(Error::Inference(format!(
                "embedder returned {} values, expected {}",
                result.embedding.len(),
                self.embedder.dimension()
            )));
        }
        let mut features: Vec<f64> = result.embedding.iter().map(|&v| f64::from(v)).collect();
        features.push((population as f64).ln_1p());
        Ok(Array1::from_vec(features))
    }

    pub fn assess(&self, complaint: &str, population: u64) -> Result<RiskAssessment> {
        let features = self.features(complaint, population)?;
        let scaled = self.scaler.transform(features)?;
        let raw = self.regressor.predict(&scaled)?;
        if !raw.is_finite() {
            return Err(Error::Inference(format!("regressor returned {}", raw)));
        }

        let risk_score = round_score(raw);
        let severity = Severity::from_score(raw);
        debug!(
            "Scored complaint: population={} raw={:.4} score={} severity={}",
            population, raw, risk_score, severity
        );
        Ok(RiskAssessment {
            risk_score,
            severity,
        })
    }
}

/// Two-decimal rounding of a risk score.
pub fn round_score(raw: f64) -> f64 {
    (raw * 100.0).round() / 100.0
}
