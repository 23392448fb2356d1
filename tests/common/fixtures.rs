//! Test fixtures for integration tests.

use std::sync::Arc;

use barter_match::embedding::{MockEmbeddingBackend, SemanticEmbedder};
use barter_match::features::{FeatureExtractor, MatchingFeatures, MatchingRecord, MatchingStore};
use barter_match::model::ModelPredictor;
use barter_match::scoring::HybridMatcher;

pub const DEFAULT_CATEGORY: &str = "спорт";

#[derive(Default)]
pub struct RecordBuilder {
    pair_id: Option<String>,
    text1: Option<String>,
    text2: Option<String>,
    category1: Option<String>,
    category2: Option<String>,
    features: Option<MatchingFeatures>,
    semantic: Option<f64>,
    label: Option<bool>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pair_id(mut self, id: impl Into<String>) -> Self {
        self.pair_id = Some(id.into());
        self
    }

    pub fn texts(mut self, text1: &str, text2: &str) -> Self {
        self.text1 = Some(text1.to_string());
        self.text2 = Some(text2.to_string());
        self
    }

    pub fn categories(mut self, category1: &str, category2: &str) -> Self {
        self.category1 = Some(category1.to_string());
        self.category2 = Some(category2.to_string());
        self
    }

    pub fn semantic(mut self, similarity: f64) -> Self {
        self.semantic = Some(similarity);
        self
    }

    pub fn label(mut self, is_match: bool) -> Self {
        self.label = Some(is_match);
        self
    }

    /// Separable features for a matching or non-matching pair; `seed` adds
    /// a small deterministic jitter.
    pub fn with_typical_features(mut self, is_match: bool, seed: usize) -> Self {
        let jitter = (seed % 5) as f64 * 0.02;
        self.features = Some(if is_match {
            MatchingFeatures {
                equivalence_score: 0.7 + jitter,
                category_match: 1.0,
                word_overlap: 0.6 + jitter,
                length_diff: 0.1,
                synonym_ratio: 0.4,
                keyword_similarity: 0.5,
                is_valid: 1.0,
                exact_match: 0.0,
            }
        } else {
            MatchingFeatures {
                equivalence_score: 0.05 + jitter,
                category_match: 0.1,
                word_overlap: 0.0,
                length_diff: 0.6 + jitter,
                synonym_ratio: 0.0,
                keyword_similarity: 0.0,
                is_valid: 0.0,
                exact_match: 0.0,
            }
        });
        self
    }

    pub fn build(self) -> MatchingRecord {
        let record = MatchingRecord::new(
            self.pair_id.unwrap_or_else(|| "pair".to_string()),
            self.text1.unwrap_or_else(|| "велосипед горный".to_string()),
            self.text2.unwrap_or_else(|| "велосипед".to_string()),
            self.category1.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            self.category2.unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            self.features.unwrap_or_default(),
        );
        let record = match self.semantic {
            Some(similarity) => record.with_semantic_similarity(similarity),
            None => record,
        };
        match self.label {
            Some(is_match) => record.labeled(is_match, None, None),
            None => record,
        }
    }
}

/// Adds `count` alternating positive/negative labeled records.
pub fn add_labeled_records(store: &mut MatchingStore, prefix: &str, count: usize) {
    for i in 0..count {
        let is_match = i % 2 == 0;
        let record = RecordBuilder::new()
            .pair_id(format!("{prefix}-{i}"))
            .with_typical_features(is_match, i)
            .semantic(if is_match { 0.85 } else { 0.15 })
            .label(is_match)
            .build();
        store.add(record).expect("add labeled record");
    }
}

/// Matcher with default rules, a mock embedder and the given predictor.
pub fn mock_matcher(predictor: Arc<ModelPredictor>) -> HybridMatcher {
    HybridMatcher::new(
        Arc::new(FeatureExtractor::default()),
        Arc::new(SemanticEmbedder::new(Arc::new(MockEmbeddingBackend::new()))),
        predictor,
    )
}
