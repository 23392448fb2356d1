use super::config::BackendKind;
use super::error::EmbeddingError;
use super::utils::cosine_similarity;

/// A text-embedding capability.
///
/// Implementations may block on CPU or an accelerator; async callers should
/// offload to a blocking pool.
pub trait EmbeddingBackend: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> BackendKind;

    fn model_name(&self) -> &str;

    /// One vector per input text, in input order.
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Similarity of two texts; cosine of their embeddings by default.
    fn similarity(&self, text1: &str, text2: &str) -> Result<f64, EmbeddingError> {
        let vectors = self.encode(&[text1, text2])?;
        match vectors.as_slice() {
            [a, b] => Ok(cosine_similarity(a, b)),
            _ => Err(EmbeddingError::CountMismatch {
                expected: 2,
                actual: vectors.len(),
            }),
        }
    }
}
