use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::{Once, RwLock};
use tracing::{debug, info, warn};

use crate::constants::{
    DEFAULT_DECISION_THRESHOLD, FALLBACK_CATEGORY_WEIGHT, FALLBACK_EQUIVALENCE_WEIGHT,
    FALLBACK_OVERLAP_WEIGHT, FEATURE_CATEGORY_MATCH, FEATURE_EQUIVALENCE, FEATURE_WORD_OVERLAP,
};

use super::artifact::{ArtifactStore, ModelArtifact};
use super::error::{ModelError, ModelResult};

#[derive(Debug, Clone, PartialEq)]
pub struct PredictorConfig {
    /// Root of the versioned artifact store. `None` runs on the heuristic only.
    pub model_dir: Option<PathBuf>,
    /// Pin a version instead of following `LATEST`.
    pub version: Option<String>,
    /// Threshold used to binarize the heuristic when no artifact is loaded.
    pub fallback_threshold: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            model_dir: None,
            version: None,
            fallback_threshold: DEFAULT_DECISION_THRESHOLD,
        }
    }
}

impl PredictorConfig {
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: Some(model_dir.into()),
            ..Self::default()
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_fallback_threshold(mut self, threshold: f64) -> Self {
        self.fallback_threshold = threshold;
        self
    }
}

/// `0.5 * equivalence + 0.3 * category_match + 0.2 * word_overlap`, missing keys as 0.0.
pub fn fallback_score(features: &HashMap<String, f64>) -> f64 {
    let get = |name: &str| features.get(name).copied().unwrap_or(0.0);
    FALLBACK_EQUIVALENCE_WEIGHT * get(FEATURE_EQUIVALENCE)
        + FALLBACK_CATEGORY_WEIGHT * get(FEATURE_CATEGORY_MATCH)
        + FALLBACK_OVERLAP_WEIGHT * get(FEATURE_WORD_OVERLAP)
}

/// Classifier wrapper with a heuristic fallback.
///
/// The artifact is loaded lazily, exactly once, on first use. Concurrent first
/// callers block on the init guard instead of loading twice. A newly trained
/// version is only picked up through [`ModelPredictor::reload`]. Share one
/// instance behind an `Arc`.
#[derive(Debug)]
pub struct ModelPredictor {
    config: PredictorConfig,
    init: Once,
    artifact: RwLock<Option<Arc<ModelArtifact>>>,
}

impl ModelPredictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self {
            config,
            init: Once::new(),
            artifact: RwLock::new(None),
        }
    }

    /// A predictor serving `artifact` without touching the filesystem.
    pub fn with_artifact(artifact: ModelArtifact) -> Self {
        let predictor = Self::new(PredictorConfig {
            fallback_threshold: artifact.threshold,
            ..PredictorConfig::default()
        });
        predictor.init.call_once(|| {});
        *predictor.artifact.write() = Some(Arc::new(artifact));
        predictor
    }

    /// A predictor that always answers with the heuristic.
    pub fn unavailable() -> Self {
        Self::new(PredictorConfig::default())
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Runs the one-time load if it has not happened yet.
    pub fn ensure_loaded(&self) {
        self.init.call_once(|| match self.load_from_store() {
            Ok(Some(artifact)) => {
                info!(
                    version = %artifact.version,
                    model_type = artifact.classifier.kind().as_str(),
                    threshold = artifact.threshold,
                    features = artifact.feature_names.len(),
                    "Model loaded"
                );
                if !artifact.classifier.supports_probability() {
                    warn!(
                        model_type = artifact.classifier.kind().as_str(),
                        "Classifier has no probability output, probability requests use the heuristic"
                    );
                }
                *self.artifact.write() = Some(Arc::new(artifact));
            }
            Ok(None) => {
                warn!("No model directory configured, using heuristic fallback");
            }
            Err(e) => {
                warn!(error = %e, "Model unavailable, using heuristic fallback");
            }
        });
    }

    /// Loads the configured version again and swaps it in. On failure the
    /// current artifact stays active.
    pub fn reload(&self) -> ModelResult<String> {
        // Block the lazy path so it cannot overwrite the reloaded artifact.
        self.init.call_once(|| {});

        let artifact = self
            .load_from_store()?
            .ok_or(ModelError::NotConfigured)?;
        let version = artifact.version.clone();
        *self.artifact.write() = Some(Arc::new(artifact));

        info!(version = %version, "Model reloaded");
        Ok(version)
    }

    fn load_from_store(&self) -> ModelResult<Option<ModelArtifact>> {
        let Some(model_dir) = &self.config.model_dir else {
            return Ok(None);
        };
        let store = ArtifactStore::new(model_dir);
        let artifact = match &self.config.version {
            Some(version) => store.load(version)?,
            None => store.load_latest()?,
        };
        Ok(Some(artifact))
    }

    pub fn is_model_loaded(&self) -> bool {
        self.ensure_loaded();
        self.artifact.read().is_some()
    }

    pub fn artifact(&self) -> Option<Arc<ModelArtifact>> {
        self.ensure_loaded();
        self.artifact.read().clone()
    }

    /// Decision threshold of the active artifact, or the fallback threshold.
    pub fn threshold(&self) -> f64 {
        self.artifact()
            .map(|a| a.threshold)
            .unwrap_or(self.config.fallback_threshold)
    }

    /// Match probability (`want_probability`) or a 0/1 decision.
    ///
    /// Without an artifact, or when a probability is requested from a
    /// classifier that has none, the heuristic answers instead; a decision on
    /// the heuristic path is the heuristic binarized against the threshold.
    pub fn predict(&self, features: &HashMap<String, f64>, want_probability: bool) -> f64 {
        let artifact = self.artifact();
        self.predict_with(artifact.as_deref(), features, want_probability)
    }

    /// [`predict`](Self::predict) for many feature maps against one artifact snapshot.
    pub fn predict_batch(
        &self,
        batch: &[HashMap<String, f64>],
        want_probability: bool,
    ) -> Vec<f64> {
        let artifact = self.artifact();
        batch
            .iter()
            .map(|features| self.predict_with(artifact.as_deref(), features, want_probability))
            .collect()
    }

    fn predict_with(
        &self,
        artifact: Option<&ModelArtifact>,
        features: &HashMap<String, f64>,
        want_probability: bool,
    ) -> f64 {
        let threshold = artifact
            .map(|a| a.threshold)
            .unwrap_or(self.config.fallback_threshold);

        let Some(artifact) = artifact else {
            debug!("Predicting with heuristic fallback (no model)");
            return self.heuristic(features, want_probability, threshold);
        };

        let x = artifact.scaled(features);
        if want_probability {
            match artifact.classifier.predict_proba(&x) {
                Some(probability) => probability,
                None => {
                    debug!("Predicting with heuristic fallback (no probability output)");
                    self.heuristic(features, true, threshold)
                }
            }
        } else if artifact.classifier.predict(&x, threshold) {
            1.0
        } else {
            0.0
        }
    }

    fn heuristic(
        &self,
        features: &HashMap<String, f64>,
        want_probability: bool,
        threshold: f64,
    ) -> f64 {
        let score = fallback_score(features);
        if want_probability {
            score
        } else if score >= threshold {
            1.0
        } else {
            0.0
        }
    }
}
