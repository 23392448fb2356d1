//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `BARTER_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_DECISION_THRESHOLD, DEFAULT_ML_WEIGHT, DEFAULT_RULE_WEIGHT, DEFAULT_SEMANTIC_WEIGHT,
};
use crate::embedding::EmbedderConfig;
use crate::model::PredictorConfig;

/// Default file name of the labeled-pair log inside the data directory.
pub const RECORDS_FILE: &str = "matching_records.jsonl";
/// Default file name of the feedback log inside the data directory.
pub const FEEDBACK_FILE: &str = "feedback.jsonl";
/// Default model store directory name inside the data directory.
pub const MODELS_DIR: &str = "models";

/// Engine configuration loaded from environment variables.
///
/// Use [`EngineConfig::from_env`] to read `BARTER_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Root for runtime data. Default: `./.data`.
    pub data_dir: PathBuf,

    /// Labeled-pair log. Default: `<data_dir>/matching_records.jsonl`.
    pub records_path: PathBuf,

    /// Feedback log. Default: `<data_dir>/feedback.jsonl`.
    pub feedback_path: PathBuf,

    /// Versioned model store. Default: `<data_dir>/models`.
    pub model_dir: PathBuf,

    /// BERT model directory. Unset means the lexical fallback.
    pub embedding_model_path: Option<PathBuf>,

    /// Registry name of the embedding model.
    pub embedding_model_name: Option<String>,

    /// JSON `{word: lemma}` dictionary for lemmatization.
    pub lemma_dictionary: Option<PathBuf>,

    /// JSON list of category configs. Unset means built-in categories.
    pub categories_path: Option<PathBuf>,

    /// JSON list of synonym groups. Unset means built-in groups.
    pub synonyms_path: Option<PathBuf>,

    pub rule_weight: f64,
    pub ml_weight: f64,
    pub semantic_weight: f64,

    /// Cutoff on the blended score for a match decision. Default: `0.5`.
    pub decision_threshold: f64,

    /// Labeled records required before training. Default: `50`.
    pub min_training_samples: usize,

    /// Feedback volume or backlog that triggers retraining. Default: `100`.
    pub min_new_feedback: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_data_dir("./.data")
    }
}

impl EngineConfig {
    const ENV_DATA_DIR: &'static str = "BARTER_DATA_DIR";
    const ENV_RECORDS_PATH: &'static str = "BARTER_RECORDS_PATH";
    const ENV_FEEDBACK_PATH: &'static str = "BARTER_FEEDBACK_PATH";
    const ENV_MODEL_DIR: &'static str = "BARTER_MODEL_DIR";
    const ENV_EMBEDDING_MODEL_PATH: &'static str = "BARTER_EMBEDDING_MODEL_PATH";
    const ENV_EMBEDDING_MODEL_NAME: &'static str = "BARTER_EMBEDDING_MODEL_NAME";
    const ENV_LEMMA_DICTIONARY: &'static str = "BARTER_LEMMA_DICTIONARY";
    const ENV_CATEGORIES_PATH: &'static str = "BARTER_CATEGORIES_PATH";
    const ENV_SYNONYMS_PATH: &'static str = "BARTER_SYNONYMS_PATH";
    const ENV_RULE_WEIGHT: &'static str = "BARTER_RULE_WEIGHT";
    const ENV_ML_WEIGHT: &'static str = "BARTER_ML_WEIGHT";
    const ENV_SEMANTIC_WEIGHT: &'static str = "BARTER_SEMANTIC_WEIGHT";
    const ENV_DECISION_THRESHOLD: &'static str = "BARTER_DECISION_THRESHOLD";
    const ENV_MIN_TRAINING_SAMPLES: &'static str = "BARTER_MIN_TRAINING_SAMPLES";
    const ENV_MIN_NEW_FEEDBACK: &'static str = "BARTER_MIN_NEW_FEEDBACK";

    /// Defaults with every data path rooted at `data_dir`.
    pub fn with_data_dir<P: Into<PathBuf>>(data_dir: P) -> Self {
        let data_dir = data_dir.into();
        Self {
            records_path: data_dir.join(RECORDS_FILE),
            feedback_path: data_dir.join(FEEDBACK_FILE),
            model_dir: data_dir.join(MODELS_DIR),
            data_dir,
            embedding_model_path: None,
            embedding_model_name: None,
            lemma_dictionary: None,
            categories_path: None,
            synonyms_path: None,
            rule_weight: DEFAULT_RULE_WEIGHT,
            ml_weight: DEFAULT_ML_WEIGHT,
            semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            decision_threshold: DEFAULT_DECISION_THRESHOLD,
            min_training_samples: 50,
            min_new_feedback: 100,
        }
    }

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = Self::parse_path_from_env(Self::ENV_DATA_DIR, PathBuf::from("./.data"));
        let defaults = Self::with_data_dir(data_dir);

        Ok(Self {
            records_path: Self::parse_path_from_env(Self::ENV_RECORDS_PATH, defaults.records_path),
            feedback_path: Self::parse_path_from_env(
                Self::ENV_FEEDBACK_PATH,
                defaults.feedback_path,
            ),
            model_dir: Self::parse_path_from_env(Self::ENV_MODEL_DIR, defaults.model_dir),
            embedding_model_path: Self::parse_optional_path_from_env(
                Self::ENV_EMBEDDING_MODEL_PATH,
            ),
            embedding_model_name: Self::parse_optional_string_from_env(
                Self::ENV_EMBEDDING_MODEL_NAME,
            ),
            lemma_dictionary: Self::parse_optional_path_from_env(Self::ENV_LEMMA_DICTIONARY),
            categories_path: Self::parse_optional_path_from_env(Self::ENV_CATEGORIES_PATH),
            synonyms_path: Self::parse_optional_path_from_env(Self::ENV_SYNONYMS_PATH),
            rule_weight: Self::parse_f64_from_env(Self::ENV_RULE_WEIGHT, defaults.rule_weight)?,
            ml_weight: Self::parse_f64_from_env(Self::ENV_ML_WEIGHT, defaults.ml_weight)?,
            semantic_weight: Self::parse_f64_from_env(
                Self::ENV_SEMANTIC_WEIGHT,
                defaults.semantic_weight,
            )?,
            decision_threshold: Self::parse_f64_from_env(
                Self::ENV_DECISION_THRESHOLD,
                defaults.decision_threshold,
            )?,
            min_training_samples: Self::parse_usize_from_env(
                Self::ENV_MIN_TRAINING_SAMPLES,
                defaults.min_training_samples,
            )?,
            min_new_feedback: Self::parse_usize_from_env(
                Self::ENV_MIN_NEW_FEEDBACK,
                defaults.min_new_feedback,
            )?,
            data_dir: defaults.data_dir,
        })
    }

    /// Validates paths and numeric ranges (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        for dir in [&self.data_dir, &self.model_dir] {
            if dir.exists() && !dir.is_dir() {
                return Err(ConfigError::NotADirectory { path: dir.clone() });
            }
        }

        for file in [&self.records_path, &self.feedback_path] {
            if file.exists() && !file.is_file() {
                return Err(ConfigError::NotAFile { path: file.clone() });
            }
        }

        if let Some(ref path) = self.embedding_model_path {
            Self::require_dir(path)?;
        }
        for path in [
            &self.lemma_dictionary,
            &self.categories_path,
            &self.synonyms_path,
        ]
        .into_iter()
        .flatten()
        {
            Self::require_file(path)?;
        }

        for (name, value) in [
            (Self::ENV_RULE_WEIGHT, self.rule_weight),
            (Self::ENV_ML_WEIGHT, self.ml_weight),
            (Self::ENV_SEMANTIC_WEIGHT, self.semantic_weight),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidWeight { name, value });
            }
        }
        if self.rule_weight + self.ml_weight + self.semantic_weight <= 0.0 {
            return Err(ConfigError::ZeroWeights);
        }

        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(ConfigError::InvalidThreshold {
                value: self.decision_threshold,
            });
        }

        Ok(())
    }

    /// Embedding settings: BERT when a model path is configured, lexical otherwise.
    pub fn embedder_config(&self) -> EmbedderConfig {
        let config = match &self.embedding_model_path {
            Some(path) => EmbedderConfig::bert(path),
            None => EmbedderConfig::lexical(),
        };
        match &self.embedding_model_name {
            Some(name) => config.with_model_name(name),
            None => config,
        }
    }

    pub fn predictor_config(&self) -> PredictorConfig {
        PredictorConfig::new(&self.model_dir).with_fallback_threshold(self.decision_threshold)
    }

    fn require_file(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_file() {
            return Err(ConfigError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn require_dir(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        Self::parse_optional_path_from_env(var_name).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_f64_from_env(name: &'static str, default: f64) -> Result<f64, ConfigError> {
        match Self::parse_optional_string_from_env(name) {
            Some(value) => value.parse().map_err(|e: std::num::ParseFloatError| {
                ConfigError::InvalidNumber {
                    name,
                    reason: e.to_string(),
                    value,
                }
            }),
            None => Ok(default),
        }
    }

    fn parse_usize_from_env(name: &'static str, default: usize) -> Result<usize, ConfigError> {
        match Self::parse_optional_string_from_env(name) {
            Some(value) => value.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidNumber {
                    name,
                    reason: e.to_string(),
                    value,
                }
            }),
            None => Ok(default),
        }
    }
}
