use std::fmt;
use std::path::PathBuf;

use super::error::EmbeddingError;

/// Default token limit for the BERT backend.
pub const DEFAULT_MAX_SEQ_LEN: usize = 256;
/// Dimension of the hashed bag-of-words vectors produced by the lexical backend.
pub const LEXICAL_EMBEDDING_DIM: usize = 256;
/// Registry name of the lexical backend.
pub const LEXICAL_MODEL_NAME: &str = "lexical";

/// Embedding backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Sentence embeddings from a BERT-family model directory.
    Bert,
    /// Deterministic word-overlap fallback.
    Lexical,
    /// Caller-supplied backend.
    Custom,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Bert => "bert",
            BackendKind::Lexical => "lexical",
            BackendKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bert" => Ok(Self::Bert),
            "lexical" | "fallback" => Ok(Self::Lexical),
            "custom" => Ok(Self::Custom),
            other => Err(format!("unknown embedding backend: {other}")),
        }
    }
}

/// Configuration for [`SemanticEmbedder`](super::SemanticEmbedder).
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedderConfig {
    pub backend: BackendKind,
    /// Registry key; defaults to the model directory name.
    pub model_name: String,
    /// Directory with `config.json`, `model.safetensors` and `tokenizer.json`.
    pub model_path: Option<PathBuf>,
    pub max_seq_len: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self::lexical()
    }
}

impl EmbedderConfig {
    const ENV_MODEL_PATH: &'static str = "BARTER_EMBEDDING_MODEL_PATH";
    const ENV_MODEL_NAME: &'static str = "BARTER_EMBEDDING_MODEL_NAME";

    /// A BERT backend loaded from `model_path`.
    pub fn bert<P: Into<PathBuf>>(model_path: P) -> Self {
        let model_path = model_path.into();
        let model_name = model_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "bert".to_string());
        Self {
            backend: BackendKind::Bert,
            model_name,
            model_path: Some(model_path),
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
        }
    }

    /// Lexical fallback only.
    pub fn lexical() -> Self {
        Self {
            backend: BackendKind::Lexical,
            model_name: LEXICAL_MODEL_NAME.to_string(),
            model_path: None,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
        }
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    /// BERT when `BARTER_EMBEDDING_MODEL_PATH` is set, lexical otherwise.
    pub fn from_env() -> Self {
        let model_path = std::env::var(Self::ENV_MODEL_PATH)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let config = match model_path {
            Some(path) => Self::bert(path),
            None => Self::lexical(),
        };

        match std::env::var(Self::ENV_MODEL_NAME)
            .ok()
            .filter(|v| !v.trim().is_empty())
        {
            Some(name) => config.with_model_name(name.trim()),
            None => config,
        }
    }

    pub fn registry_key(&self) -> (BackendKind, String) {
        (self.backend, self.model_name.clone())
    }

    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.max_seq_len == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_seq_len must be positive".to_string(),
            });
        }

        if self.backend == BackendKind::Bert {
            let Some(path) = &self.model_path else {
                return Err(EmbeddingError::InvalidConfig {
                    reason: "model_path is required for the bert backend".to_string(),
                });
            };
            if !path.is_dir() {
                return Err(EmbeddingError::ModelNotFound { path: path.clone() });
            }
        }

        Ok(())
    }
}
