use tracing::debug;

use crate::features::word_overlap;
use crate::hashing::token_bucket;
use crate::rules::normalize;

use super::backend::EmbeddingBackend;
use super::config::{BackendKind, LEXICAL_EMBEDDING_DIM, LEXICAL_MODEL_NAME};
use super::error::EmbeddingError;
use super::utils::l2_normalize;

/// Deterministic fallback backend.
///
/// `encode` produces L2-normalized hashed term-frequency vectors; `similarity`
/// is the word-overlap (Jaccard) of the normalized texts.
#[derive(Debug, Clone)]
pub struct LexicalBackend {
    dim: usize,
}

impl Default for LexicalBackend {
    fn default() -> Self {
        Self::new(LEXICAL_EMBEDDING_DIM)
    }
}

impl LexicalBackend {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    fn encode_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        for token in normalize(text).split_whitespace() {
            vector[token_bucket(token, self.dim)] += 1.0;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl EmbeddingBackend for LexicalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Lexical
    }

    fn model_name(&self) -> &str {
        LEXICAL_MODEL_NAME
    }

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        debug!(count = texts.len(), "Encoding with lexical backend");
        Ok(texts.iter().map(|text| self.encode_one(text)).collect())
    }

    fn similarity(&self, text1: &str, text2: &str) -> Result<f64, EmbeddingError> {
        Ok(word_overlap(&normalize(text1), &normalize(text2)))
    }
}
