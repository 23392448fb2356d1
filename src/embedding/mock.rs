use std::collections::HashMap;

use parking_lot::Mutex;

use super::backend::EmbeddingBackend;
use super::config::BackendKind;
use super::error::EmbeddingError;

/// Backend with scripted vectors, for tests.
///
/// Texts without a scripted vector encode to `default_vector`; `failing` makes
/// every call error so fallback paths can be exercised.
#[derive(Debug, Default)]
pub struct MockEmbeddingBackend {
    vectors: HashMap<String, Vec<f32>>,
    default_vector: Vec<f32>,
    failing: bool,
    calls: Mutex<usize>,
}

impl MockEmbeddingBackend {
    pub fn new() -> Self {
        Self {
            default_vector: vec![1.0, 0.0, 0.0],
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    /// Number of `encode` calls made so far.
    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl EmbeddingBackend for MockEmbeddingBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Custom
    }

    fn model_name(&self) -> &str {
        "mock"
    }

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        *self.calls.lock() += 1;
        if self.failing {
            return Err(EmbeddingError::InferenceFailed {
                reason: "mock backend configured to fail".to_string(),
            });
        }
        Ok(texts
            .iter()
            .map(|text| {
                self.vectors
                    .get(*text)
                    .cloned()
                    .unwrap_or_else(|| self.default_vector.clone())
            })
            .collect())
    }
}
