//! Trained classifiers and their persisted artifacts.
//!
//! A [`ModelArtifact`] bundles a [`Classifier`], its [`StandardScaler`], the ordered
//! feature names and the decision threshold. [`ArtifactStore`] saves and loads
//! bundles as versioned directories; [`ModelPredictor`] serves one with a heuristic
//! fallback when none is available.

pub mod artifact;
pub mod classifier;
pub mod error;
pub mod predictor;
pub mod scaler;

#[cfg(test)]
mod tests;

pub use artifact::{
    ArtifactStore, CLASSIFIER_FILE, FEATURE_COLUMNS_FILE, LATEST_FILE, METADATA_FILE,
    ModelArtifact, ModelMetadata, SCALER_FILE,
};
pub use classifier::{Classifier, ClassifierKind, FitParams, LinearModel, sigmoid};
pub use error::{ModelError, ModelResult};
pub use predictor::{ModelPredictor, PredictorConfig, fallback_score};
pub use scaler::StandardScaler;
