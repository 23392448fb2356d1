//! Cross-cutting, shared constants.
//!
//! Scoring constants are shared by the rule engine, the predictor fallback and the
//! training pipeline. Changing one of them changes the meaning of persisted features,
//! so bump the artifact format alongside.

/// Category weight for identical categories.
pub const SAME_CATEGORY_WEIGHT: f64 = 1.0;
/// Category weight when both categories are configured but differ.
pub const MISMATCHED_CATEGORY_WEIGHT: f64 = 0.1;
/// Category weight when at least one category is unknown.
pub const UNKNOWN_CATEGORY_WEIGHT: f64 = 0.5;

/// Minimum overlap for the strict-subset validity check.
pub const DEFAULT_MIN_OVERLAP: f64 = 0.3;
/// Multiplier applied to contextual keyword similarity.
pub const KEYWORD_BONUS_FACTOR: f64 = 0.1;
/// Multiplier applied to pairs that fail the validity check.
pub const INVALID_PAIR_PENALTY: f64 = 0.7;

/// Predictor fallback: `0.5 * equivalence + 0.3 * category + 0.2 * overlap`.
pub const FALLBACK_EQUIVALENCE_WEIGHT: f64 = 0.5;
pub const FALLBACK_CATEGORY_WEIGHT: f64 = 0.3;
pub const FALLBACK_OVERLAP_WEIGHT: f64 = 0.2;

/// Default decision threshold for binary match decisions.
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.5;

/// Default blend weights.
pub const DEFAULT_RULE_WEIGHT: f64 = 0.3;
pub const DEFAULT_ML_WEIGHT: f64 = 0.4;
pub const DEFAULT_SEMANTIC_WEIGHT: f64 = 0.3;

/// Acceptable positive-label ratio range for training.
pub const MIN_POSITIVE_RATIO: f64 = 0.3;
pub const MAX_POSITIVE_RATIO: f64 = 0.7;

/// Held-out fraction and seed used by the stratified split.
pub const TEST_FRACTION: f64 = 0.2;
pub const SPLIT_SEED: u64 = 42;

/// Feedback window used by the retraining trigger.
pub const RETRAIN_WINDOW_DAYS: i64 = 7;

/// Base feature names, in vector order.
pub const FEATURE_EQUIVALENCE: &str = "equivalence_score";
pub const FEATURE_CATEGORY_MATCH: &str = "category_match";
pub const FEATURE_WORD_OVERLAP: &str = "word_overlap";
pub const FEATURE_LENGTH_DIFF: &str = "length_diff";
pub const FEATURE_SYNONYM_RATIO: &str = "synonym_ratio";
pub const FEATURE_KEYWORD_SIMILARITY: &str = "keyword_similarity";
pub const FEATURE_IS_VALID: &str = "is_valid";
pub const FEATURE_EXACT_MATCH: &str = "exact_match";

pub const BASE_FEATURE_NAMES: [&str; 8] = [
    FEATURE_EQUIVALENCE,
    FEATURE_CATEGORY_MATCH,
    FEATURE_WORD_OVERLAP,
    FEATURE_LENGTH_DIFF,
    FEATURE_SYNONYM_RATIO,
    FEATURE_KEYWORD_SIMILARITY,
    FEATURE_IS_VALID,
    FEATURE_EXACT_MATCH,
];

/// Optional semantic features appended by the trainer.
pub const FEATURE_SEMANTIC_SIMILARITY: &str = "semantic_similarity";
pub const FEATURE_SEMANTIC_CONFIDENCE: &str = "semantic_confidence";
pub const FEATURE_SEMANTIC_CENTERED: &str = "semantic_centered";

/// Prefix for one-hot category-pair features.
pub const CATEGORY_PAIR_PREFIX: &str = "category_pair";
