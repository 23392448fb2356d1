use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use super::error::{RulesResult, read_json};

/// A linguistic backend that maps a lowercased word to its lemma.
pub trait Lemmatizer: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    /// Returns `None` when the word is unknown to the backend.
    fn lemma(&self, word: &str) -> Option<String>;
}

/// Lemmatizer backed by a `{word: lemma}` dictionary.
#[derive(Debug, Clone, Default)]
pub struct DictionaryLemmatizer {
    entries: HashMap<String, String>,
}

impl DictionaryLemmatizer {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.as_ref().to_lowercase()))
                .collect(),
        }
    }

    pub fn from_json_file(path: &Path) -> RulesResult<Self> {
        let entries: HashMap<String, String> = read_json(path)?;
        info!(
            path = %path.display(),
            entries = entries.len(),
            "Loaded lemma dictionary"
        );
        Ok(Self::from_pairs(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Lemmatizer for DictionaryLemmatizer {
    fn name(&self) -> &str {
        "dictionary"
    }

    fn lemma(&self, word: &str) -> Option<String> {
        self.entries.get(word).cloned()
    }
}

/// Lemmatization with an identity fallback.
///
/// Without a backend every word is returned lowercased as-is. Never fails.
#[derive(Debug, Clone, Default)]
pub enum MorphologyProcessor {
    Backend(Arc<dyn Lemmatizer>),
    #[default]
    Identity,
}

impl MorphologyProcessor {
    pub fn with_backend(backend: Arc<dyn Lemmatizer>) -> Self {
        Self::Backend(backend)
    }

    /// Loads a dictionary backend when a path is given, identity otherwise.
    pub fn from_optional_dictionary(path: Option<&Path>) -> RulesResult<Self> {
        match path {
            Some(path) => Ok(Self::Backend(Arc::new(DictionaryLemmatizer::from_json_file(
                path,
            )?))),
            None => Ok(Self::Identity),
        }
    }

    pub fn has_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }

    pub fn backend_name(&self) -> &str {
        match self {
            Self::Backend(backend) => backend.name(),
            Self::Identity => "identity",
        }
    }

    pub fn lemma(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        match self {
            Self::Backend(backend) => backend.lemma(&lower).unwrap_or(lower),
            Self::Identity => lower,
        }
    }

    pub fn lemma_text(&self, text: &str) -> String {
        text.split_whitespace()
            .map(|word| self.lemma(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
