use std::path::PathBuf;
use thiserror::Error;

/// Failures inside an embedding backend. [`SemanticEmbedder`](super::SemanticEmbedder)
/// turns every one of them into the lexical fallback.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("BERT checkpoint file missing: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("could not load BERT checkpoint: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("tokenizer error: {reason}")]
    TokenizationFailed { reason: String },

    #[error("forward pass failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("backend returned {actual} vectors for {expected} texts")]
    CountMismatch { expected: usize, actual: usize },

    #[error("bad embedder settings: {reason}")]
    InvalidConfig { reason: String },
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        EmbeddingError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}
