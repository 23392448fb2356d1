use serde::{Deserialize, Serialize};

use crate::features::MatchingFeatures;
use crate::rules::RuleScore;

/// A want/offer pair supplied by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub text1: String,
    pub text2: String,
    /// Empty means "infer from the text".
    #[serde(default)]
    pub category1: String,
    #[serde(default)]
    pub category2: String,
    /// Overrides the word-overlap base of the rule score.
    #[serde(default)]
    pub base_score: Option<f64>,
}

impl MatchRequest {
    pub fn new(
        text1: impl Into<String>,
        text2: impl Into<String>,
        category1: impl Into<String>,
        category2: impl Into<String>,
    ) -> Self {
        Self {
            text1: text1.into(),
            text2: text2.into(),
            category1: category1.into(),
            category2: category2.into(),
            base_score: None,
        }
    }

    pub fn with_base_score(mut self, base_score: f64) -> Self {
        self.base_score = Some(base_score);
        self
    }
}

/// Per-stage scores behind a [`MatchOutcome`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponents {
    pub rule: RuleScore,
    /// Classifier probability, or the heuristic when no model is usable.
    pub ml_score: f64,
    /// `None` when semantic scoring is disabled.
    pub semantic_score: Option<f64>,
    pub features: MatchingFeatures,
}

/// Result returned to callers for one pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchOutcome {
    pub pair_id: String,
    /// Categories actually used, after inference.
    pub category1: String,
    pub category2: String,
    pub total_score: f64,
    pub is_valid: bool,
    pub is_match: bool,
    pub components: ScoreComponents,
}
