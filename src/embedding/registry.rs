use std::sync::{Arc, OnceLock};

use moka::sync::Cache;
use tracing::info;

use super::config::{BackendKind, EmbedderConfig};
use super::embedder::SemanticEmbedder;

pub type RegistryKey = (BackendKind, String);

/// Cache of loaded embedders keyed by `(backend kind, model name)`.
///
/// Loading happens at most once per key even under concurrent first access.
pub struct EmbedderRegistry {
    embedders: Cache<RegistryKey, Arc<SemanticEmbedder>>,
}

impl std::fmt::Debug for EmbedderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedderRegistry")
            .field("entries", &self.embedders.entry_count())
            .finish()
    }
}

impl Default for EmbedderRegistry {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl EmbedderRegistry {
    const DEFAULT_CAPACITY: u64 = 8;

    pub fn new(capacity: u64) -> Self {
        Self {
            embedders: Cache::builder().max_capacity(capacity).build(),
        }
    }

    /// Process-wide registry.
    pub fn global() -> &'static EmbedderRegistry {
        static GLOBAL: OnceLock<EmbedderRegistry> = OnceLock::new();
        GLOBAL.get_or_init(EmbedderRegistry::default)
    }

    /// Returns the cached embedder for `config`, loading it on first use.
    pub fn get_or_load(&self, config: &EmbedderConfig) -> Arc<SemanticEmbedder> {
        self.embedders.get_with(config.registry_key(), || {
            info!(
                backend = %config.backend,
                model_name = %config.model_name,
                "Loading embedder into registry"
            );
            Arc::new(SemanticEmbedder::load(config))
        })
    }

    /// Registers an externally built embedder (e.g. a custom backend).
    pub fn insert(&self, key: RegistryKey, embedder: Arc<SemanticEmbedder>) {
        self.embedders.insert(key, embedder);
    }

    pub fn get(&self, key: &RegistryKey) -> Option<Arc<SemanticEmbedder>> {
        self.embedders.get(key)
    }

    pub fn contains(&self, key: &RegistryKey) -> bool {
        self.embedders.contains_key(key)
    }

    pub fn invalidate(&self, key: &RegistryKey) {
        self.embedders.invalidate(key);
    }
}
