use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ML_WEIGHT, DEFAULT_RULE_WEIGHT, DEFAULT_SEMANTIC_WEIGHT};

/// Blend weights for the rule, ML and semantic scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinerWeights {
    pub rule: f64,
    pub ml: f64,
    pub semantic: f64,
}

impl Default for CombinerWeights {
    fn default() -> Self {
        Self {
            rule: DEFAULT_RULE_WEIGHT,
            ml: DEFAULT_ML_WEIGHT,
            semantic: DEFAULT_SEMANTIC_WEIGHT,
        }
    }
}

impl CombinerWeights {
    pub fn new(rule: f64, ml: f64, semantic: f64) -> Self {
        Self { rule, ml, semantic }
    }

    /// Two-way blend: `{rule: 1 - ml_weight, ml: ml_weight, semantic: 0}`.
    pub fn from_ml_weight(ml_weight: f64) -> Self {
        Self {
            rule: 1.0 - ml_weight,
            ml: ml_weight,
            semantic: 0.0,
        }
    }

    pub fn total(&self) -> f64 {
        self.rule + self.ml + self.semantic
    }

    /// Moves the semantic weight onto rule and ML in proportion to their weights.
    pub fn redistributed(&self) -> Self {
        let rule_ml = self.rule + self.ml;
        if rule_ml <= 0.0 {
            let half = self.total() / 2.0;
            return Self::new(half, half, 0.0);
        }
        let factor = self.total() / rule_ml;
        Self::new(self.rule * factor, self.ml * factor, 0.0)
    }
}

/// Maps the legacy `0.0` "not computed" sentinel to `None`.
pub fn semantic_from_sentinel(score: f64) -> Option<f64> {
    if score == 0.0 { None } else { Some(score) }
}

/// Weighted blend of rule, ML and semantic scores, clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreCombiner {
    weights: CombinerWeights,
    normalize: bool,
}

impl Default for ScoreCombiner {
    fn default() -> Self {
        Self::new(CombinerWeights::default())
    }
}

impl ScoreCombiner {
    pub fn new(weights: CombinerWeights) -> Self {
        Self {
            weights,
            normalize: true,
        }
    }

    pub fn with_normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn weights(&self) -> CombinerWeights {
        self.weights
    }

    /// Blends the three scores.
    ///
    /// `semantic: None` means the similarity was not computed: its weight is
    /// redistributed over rule and ML. `Some(0.0)` is a real zero similarity.
    pub fn combine(&self, rule: f64, ml: f64, semantic: Option<f64>) -> f64 {
        combine(rule, ml, semantic, self.weights, self.normalize)
    }
}

/// See [`ScoreCombiner::combine`].
pub fn combine(
    rule: f64,
    ml: f64,
    semantic: Option<f64>,
    weights: CombinerWeights,
    normalize: bool,
) -> f64 {
    let (weights, semantic) = match semantic {
        Some(score) => (weights, score),
        None => (weights.redistributed(), 0.0),
    };

    let mut total = rule * weights.rule + ml * weights.ml + semantic * weights.semantic;

    let weight_sum = weights.total();
    if normalize && weights.semantic > 0.0 && weight_sum > 0.0 {
        total /= weight_sum;
    }

    if total.is_nan() {
        return 0.0;
    }
    total.clamp(0.0, 1.0)
}
