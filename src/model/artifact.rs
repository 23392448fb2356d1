use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::classifier::Classifier;
use super::error::{ModelError, ModelResult};
use super::scaler::StandardScaler;

pub const CLASSIFIER_FILE: &str = "classifier.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const METADATA_FILE: &str = "model_metadata.json";
pub const FEATURE_COLUMNS_FILE: &str = "feature_columns.json";
/// Pointer file naming the active version.
pub const LATEST_FILE: &str = "LATEST";

/// Contents of `model_metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_type: String,
    pub version: String,
    pub threshold: f64,
    pub feature_count: usize,
    pub feature_names: Vec<String>,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

/// A trained classifier with everything needed to score: scaler, ordered
/// feature names and decision threshold. Replaced wholesale, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub version: String,
    pub classifier: Classifier,
    pub scaler: StandardScaler,
    pub feature_names: Vec<String>,
    pub threshold: f64,
    pub saved_at: DateTime<Utc>,
    pub metrics: BTreeMap<String, f64>,
}

impl ModelArtifact {
    /// Checks that classifier, scaler and feature list agree on width.
    pub fn validate(&self) -> ModelResult<()> {
        let width = self.feature_names.len();
        if self.classifier.n_features() != width || self.scaler.n_features() != width {
            return Err(ModelError::Inconsistent {
                reason: format!(
                    "feature list has {} names, classifier {} weights, scaler {} columns",
                    width,
                    self.classifier.n_features(),
                    self.scaler.n_features()
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ModelError::Inconsistent {
                reason: format!("threshold {} outside [0, 1]", self.threshold),
            });
        }
        Ok(())
    }

    /// Orders `features` by the artifact's feature list; missing names become 0.0.
    pub fn vectorize(&self, features: &HashMap<String, f64>) -> Vec<f64> {
        self.feature_names
            .iter()
            .map(|name| features.get(name).copied().unwrap_or(0.0))
            .collect()
    }

    pub fn scaled(&self, features: &HashMap<String, f64>) -> Vec<f64> {
        self.scaler.transform(&self.vectorize(features))
    }

    pub fn metadata(&self) -> ModelMetadata {
        ModelMetadata {
            model_type: self.classifier.kind().as_str().to_string(),
            version: self.version.clone(),
            threshold: self.threshold,
            feature_count: self.feature_names.len(),
            feature_names: self.feature_names.clone(),
            saved_at: self.saved_at,
            metrics: self.metrics.clone(),
        }
    }
}

/// Versioned bundles under `root/<version>/`, with `root/LATEST` naming the
/// active one.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.root.join(version)
    }

    /// Writes the bundle into a staging directory, renames it into place and
    /// then points `LATEST` at it.
    pub fn save(&self, artifact: &ModelArtifact) -> ModelResult<PathBuf> {
        artifact.validate()?;

        let final_dir = self.version_dir(&artifact.version);
        let staging_dir = self.root.join(format!(".{}.tmp", artifact.version));
        if staging_dir.exists() {
            fs::remove_dir_all(&staging_dir).map_err(|e| ModelError::io(&staging_dir, e))?;
        }
        fs::create_dir_all(&staging_dir).map_err(|e| ModelError::io(&staging_dir, e))?;

        write_json(&staging_dir.join(CLASSIFIER_FILE), &artifact.classifier)?;
        write_json(&staging_dir.join(SCALER_FILE), &artifact.scaler)?;
        write_json(&staging_dir.join(FEATURE_COLUMNS_FILE), &artifact.feature_names)?;
        write_json(&staging_dir.join(METADATA_FILE), &artifact.metadata())?;

        if final_dir.exists() {
            fs::remove_dir_all(&final_dir).map_err(|e| ModelError::io(&final_dir, e))?;
        }
        fs::rename(&staging_dir, &final_dir).map_err(|e| ModelError::io(&final_dir, e))?;

        let latest = self.root.join(LATEST_FILE);
        let latest_tmp = self.root.join(format!("{LATEST_FILE}.tmp"));
        fs::write(&latest_tmp, &artifact.version).map_err(|e| ModelError::io(&latest_tmp, e))?;
        fs::rename(&latest_tmp, &latest).map_err(|e| ModelError::io(&latest, e))?;

        info!(
            version = %artifact.version,
            path = %final_dir.display(),
            model_type = artifact.classifier.kind().as_str(),
            features = artifact.feature_names.len(),
            "Model bundle saved"
        );
        Ok(final_dir)
    }

    pub fn latest_version(&self) -> ModelResult<String> {
        let latest = self.root.join(LATEST_FILE);
        let version = fs::read_to_string(&latest).map_err(|_| ModelError::NoActiveVersion {
            root: self.root.clone(),
        })?;
        let version = version.trim().to_string();
        if version.is_empty() {
            return Err(ModelError::NoActiveVersion {
                root: self.root.clone(),
            });
        }
        Ok(version)
    }

    pub fn load_latest(&self) -> ModelResult<ModelArtifact> {
        let version = self.latest_version()?;
        self.load(&version)
    }

    pub fn load(&self, version: &str) -> ModelResult<ModelArtifact> {
        Self::load_dir(&self.version_dir(version))
    }

    /// Loads a bundle directory. Any missing or malformed component fails the
    /// whole load.
    pub fn load_dir(dir: &Path) -> ModelResult<ModelArtifact> {
        let classifier: Classifier = read_json(dir, CLASSIFIER_FILE)?;
        let scaler: StandardScaler = read_json(dir, SCALER_FILE)?;
        let feature_names: Vec<String> = read_json(dir, FEATURE_COLUMNS_FILE)?;
        let metadata: ModelMetadata = read_json(dir, METADATA_FILE)?;

        if metadata.feature_names != feature_names {
            return Err(ModelError::Inconsistent {
                reason: "metadata feature_names differ from feature_columns.json".to_string(),
            });
        }
        if metadata.model_type != classifier.kind().as_str() {
            return Err(ModelError::Inconsistent {
                reason: format!(
                    "metadata model_type '{}' does not match classifier '{}'",
                    metadata.model_type,
                    classifier.kind().as_str()
                ),
            });
        }

        let artifact = ModelArtifact {
            version: metadata.version,
            classifier,
            scaler,
            feature_names,
            threshold: metadata.threshold,
            saved_at: metadata.saved_at,
            metrics: metadata.metrics,
        };
        artifact.validate()?;

        debug!(path = %dir.display(), version = %artifact.version, "Model bundle loaded");
        Ok(artifact)
    }

    /// Saved versions, oldest first.
    pub fn list_versions(&self) -> ModelResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut versions = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(|e| ModelError::io(&self.root, e))? {
            let entry = entry.map_err(|e| ModelError::io(&self.root, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.path().is_dir() && !name.starts_with('.') {
                versions.push(name);
            }
        }
        versions.sort();
        Ok(versions)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> ModelResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(|e| ModelError::serde(path, e))?;
    fs::write(path, json).map_err(|e| ModelError::io(path, e))
}

fn read_json<T: DeserializeOwned>(dir: &Path, file: &'static str) -> ModelResult<T> {
    let path = dir.join(file);
    if !path.exists() {
        return Err(ModelError::MissingComponent {
            path: dir.to_path_buf(),
            component: file,
        });
    }
    let content = fs::read_to_string(&path).map_err(|e| ModelError::io(&path, e))?;
    serde_json::from_str(&content).map_err(|e| ModelError::serde(&path, e))
}
