//! Text embeddings and semantic similarity.
//!
//! - [`EmbeddingBackend`] is the capability seam.
//! - [`BertBackend`] runs a BERT-family checkpoint with candle.
//! - [`LexicalBackend`] is the deterministic fallback.
//! - [`SemanticEmbedder`] wraps a backend with the fallback and never fails.
//! - [`EmbedderRegistry`] caches embedders per `(backend, model name)`.

pub mod backend;
/// BERT sentence embedder.
pub mod bert;
pub mod config;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
pub mod embedder;
mod error;
pub mod lexical;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod registry;
/// Tokenizer loading and vector helpers.
pub mod utils;


pub use backend::EmbeddingBackend;
pub use bert::BertBackend;
pub use config::{BackendKind, EmbedderConfig, LEXICAL_EMBEDDING_DIM, LEXICAL_MODEL_NAME};
pub use embedder::SemanticEmbedder;
pub use error::EmbeddingError;
pub use lexical::LexicalBackend;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbeddingBackend;
pub use registry::{EmbedderRegistry, RegistryKey};
pub use utils::cosine_similarity;
