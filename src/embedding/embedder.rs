use std::sync::Arc;

use tracing::{debug, warn};

use super::backend::EmbeddingBackend;
use super::bert::BertBackend;
use super::config::{BackendKind, EmbedderConfig};
use super::lexical::LexicalBackend;
use super::utils::cosine_similarity;

/// Semantic similarity with a deterministic lexical fallback.
///
/// Holds an optional primary backend. Every call that fails on the primary
/// (or runs without one) is answered by [`LexicalBackend`], so the methods
/// here never return errors.
#[derive(Debug, Clone)]
pub struct SemanticEmbedder {
    primary: Option<Arc<dyn EmbeddingBackend>>,
    fallback: LexicalBackend,
}

impl Default for SemanticEmbedder {
    fn default() -> Self {
        Self::fallback_only()
    }
}

impl SemanticEmbedder {
    pub fn new(primary: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            primary: Some(primary),
            fallback: LexicalBackend::default(),
        }
    }

    pub fn fallback_only() -> Self {
        Self {
            primary: None,
            fallback: LexicalBackend::default(),
        }
    }

    /// Builds the configured backend; load failures degrade to the fallback.
    pub fn load(config: &EmbedderConfig) -> Self {
        match config.backend {
            BackendKind::Bert => match BertBackend::load(config) {
                Ok(backend) => Self::new(Arc::new(backend)),
                Err(e) => {
                    warn!(
                        error = %e,
                        model_name = %config.model_name,
                        "Embedding model unavailable, using lexical fallback"
                    );
                    Self::fallback_only()
                }
            },
            BackendKind::Lexical | BackendKind::Custom => Self::fallback_only(),
        }
    }

    /// `true` when a real embedding backend is active.
    pub fn is_available(&self) -> bool {
        self.primary.is_some()
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.primary
            .as_ref()
            .map(|p| p.kind())
            .unwrap_or(BackendKind::Lexical)
    }

    pub fn model_name(&self) -> &str {
        match &self.primary {
            Some(primary) => primary.model_name(),
            None => self.fallback.model_name(),
        }
    }

    pub fn encode(&self, texts: &[&str]) -> Vec<Vec<f32>> {
        if texts.is_empty() {
            return Vec::new();
        }

        if let Some(primary) = &self.primary {
            match primary.encode(texts) {
                Ok(vectors) if vectors.len() == texts.len() => return vectors,
                Ok(vectors) => warn!(
                    expected = texts.len(),
                    got = vectors.len(),
                    "Embedding backend returned wrong count, using fallback"
                ),
                Err(e) => warn!(error = %e, "Embedding failed, using fallback"),
            }
        }

        texts
            .iter()
            .map(|text| {
                self.fallback
                    .encode(&[*text])
                    .ok()
                    .and_then(|mut v| v.pop())
                    .unwrap_or_else(|| vec![0.0; self.fallback.dim()])
            })
            .collect()
    }

    /// Cosine similarity clamped to `[0, 1]`.
    pub fn similarity(&self, text1: &str, text2: &str) -> f64 {
        if let Some(primary) = &self.primary {
            match primary.similarity(text1, text2) {
                Ok(similarity) => return clamp_unit(similarity),
                Err(e) => warn!(error = %e, "Semantic similarity failed, using fallback"),
            }
        }

        debug!("Semantic similarity via lexical fallback");
        self.fallback_similarity(text1, text2)
    }

    /// Similarities for many pairs; the primary backend encodes all texts in one call.
    pub fn batch_similarity(&self, pairs: &[(&str, &str)]) -> Vec<f64> {
        if pairs.is_empty() {
            return Vec::new();
        }

        if let Some(primary) = &self.primary {
            let texts: Vec<&str> = pairs.iter().flat_map(|(a, b)| [*a, *b]).collect();
            match primary.encode(&texts) {
                Ok(vectors) if vectors.len() == texts.len() => {
                    return vectors
                        .chunks_exact(2)
                        .map(|pair| clamp_unit(cosine_similarity(&pair[0], &pair[1])))
                        .collect();
                }
                Ok(_) => warn!("Embedding backend returned wrong count, using fallback"),
                Err(e) => warn!(error = %e, "Batch embedding failed, using fallback"),
            }
        }

        pairs
            .iter()
            .map(|(a, b)| self.fallback_similarity(a, b))
            .collect()
    }

    fn fallback_similarity(&self, text1: &str, text2: &str) -> f64 {
        self.fallback
            .similarity(text1, text2)
            .map(clamp_unit)
            .unwrap_or(0.0)
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}
