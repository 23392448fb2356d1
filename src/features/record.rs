use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    BASE_FEATURE_NAMES, FEATURE_CATEGORY_MATCH, FEATURE_EQUIVALENCE, FEATURE_EXACT_MATCH,
    FEATURE_IS_VALID, FEATURE_KEYWORD_SIMILARITY, FEATURE_LENGTH_DIFF, FEATURE_SYNONYM_RATIO,
    FEATURE_WORD_OVERLAP,
};

/// The fixed base feature vector of a pair. All values are nominally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MatchingFeatures {
    /// Rule-based total score.
    pub equivalence_score: f64,
    /// Category compatibility weight.
    pub category_match: f64,
    pub word_overlap: f64,
    pub length_diff: f64,
    pub synonym_ratio: f64,
    pub keyword_similarity: f64,
    /// 1.0 when the subset-overlap check passed.
    pub is_valid: f64,
    /// 1.0 when the normalized texts are equal.
    pub exact_match: f64,
}

impl MatchingFeatures {
    /// Values in [`BASE_FEATURE_NAMES`] order.
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.equivalence_score,
            self.category_match,
            self.word_overlap,
            self.length_diff,
            self.synonym_ratio,
            self.keyword_similarity,
            self.is_valid,
            self.exact_match,
        ]
    }

    pub fn to_map(&self) -> HashMap<String, f64> {
        BASE_FEATURE_NAMES
            .iter()
            .map(|name| name.to_string())
            .zip(self.to_vec())
            .collect()
    }

    /// Builds features from a name → value map; missing keys become 0.0.
    pub fn from_map(map: &HashMap<String, f64>) -> Self {
        let get = |name: &str| map.get(name).copied().unwrap_or(0.0);
        Self {
            equivalence_score: get(FEATURE_EQUIVALENCE),
            category_match: get(FEATURE_CATEGORY_MATCH),
            word_overlap: get(FEATURE_WORD_OVERLAP),
            length_diff: get(FEATURE_LENGTH_DIFF),
            synonym_ratio: get(FEATURE_SYNONYM_RATIO),
            keyword_similarity: get(FEATURE_KEYWORD_SIMILARITY),
            is_valid: get(FEATURE_IS_VALID),
            exact_match: get(FEATURE_EXACT_MATCH),
        }
    }
}

/// A scored pair, optionally labeled. Records are values: labeling produces a
/// new record that the store appends, so the log keeps every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingRecord {
    pub pair_id: String,
    pub text1: String,
    pub text2: String,
    pub category1: String,
    pub category2: String,
    #[serde(flatten)]
    pub features: MatchingFeatures,
    #[serde(default)]
    pub semantic_similarity: Option<f64>,
    #[serde(default)]
    pub is_match: Option<bool>,
    #[serde(default)]
    pub user_feedback: Option<String>,
    #[serde(default)]
    pub match_quality: Option<f64>,
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl MatchingRecord {
    pub fn new(
        pair_id: impl Into<String>,
        text1: impl Into<String>,
        text2: impl Into<String>,
        category1: impl Into<String>,
        category2: impl Into<String>,
        features: MatchingFeatures,
    ) -> Self {
        Self {
            pair_id: pair_id.into(),
            text1: text1.into(),
            text2: text2.into(),
            category1: category1.into(),
            category2: category2.into(),
            features,
            semantic_similarity: None,
            is_match: None,
            user_feedback: None,
            match_quality: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_semantic_similarity(mut self, similarity: f64) -> Self {
        self.semantic_similarity = Some(similarity);
        self
    }

    /// Returns a copy carrying the given label fields and a fresh timestamp.
    pub fn labeled(
        &self,
        is_match: bool,
        user_feedback: Option<String>,
        match_quality: Option<f64>,
    ) -> Self {
        Self {
            is_match: Some(is_match),
            user_feedback: user_feedback.or_else(|| self.user_feedback.clone()),
            match_quality: match_quality.or(self.match_quality),
            recorded_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn is_labeled(&self) -> bool {
        self.is_match.is_some()
    }

    pub fn feature_map(&self) -> HashMap<String, f64> {
        self.features.to_map()
    }
}
