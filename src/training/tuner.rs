use serde::{Deserialize, Serialize};
use tracing::debug;

use super::metrics::ConfusionMatrix;

/// Metric maximized by [`ThresholdTuner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TuneMetric {
    #[default]
    F1,
    Precision,
    Recall,
    /// Mean of the positive-class and negative-class F1.
    BalancedF1,
}

impl TuneMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            TuneMetric::F1 => "f1",
            TuneMetric::Precision => "precision",
            TuneMetric::Recall => "recall",
            TuneMetric::BalancedF1 => "balanced_f1",
        }
    }

    pub fn score(&self, confusion: &ConfusionMatrix) -> f64 {
        match self {
            TuneMetric::F1 => confusion.f1(),
            TuneMetric::Precision => confusion.precision(),
            TuneMetric::Recall => confusion.recall(),
            TuneMetric::BalancedF1 => (confusion.f1() + confusion.negative_f1()) / 2.0,
        }
    }
}

impl std::str::FromStr for TuneMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "f1" => Ok(Self::F1),
            "precision" => Ok(Self::Precision),
            "recall" => Ok(Self::Recall),
            "balanced_f1" | "balanced" => Ok(Self::BalancedF1),
            other => Err(format!("unknown metric: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TunerConfig {
    pub min_threshold: f64,
    pub max_threshold: f64,
    pub step: f64,
    pub metric: TuneMetric,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            min_threshold: 0.1,
            max_threshold: 0.9,
            step: 0.01,
            metric: TuneMetric::F1,
        }
    }
}

impl TunerConfig {
    pub fn with_metric(mut self, metric: TuneMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_range(mut self, min_threshold: f64, max_threshold: f64, step: f64) -> Self {
        self.min_threshold = min_threshold;
        self.max_threshold = max_threshold;
        self.step = step;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TuningResult {
    pub threshold: f64,
    pub score: f64,
    pub metric: TuneMetric,
    pub candidates: usize,
}

/// Grid search over decision thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdTuner {
    config: TunerConfig,
}

impl ThresholdTuner {
    pub fn new(config: TunerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    /// Ascending candidate thresholds, rounded to six decimals so that the
    /// grid hits values like `0.41` exactly.
    pub fn candidates(&self) -> Vec<f64> {
        let TunerConfig {
            min_threshold,
            max_threshold,
            step,
            ..
        } = self.config;
        if step <= 0.0 || max_threshold < min_threshold {
            return vec![min_threshold];
        }
        let steps = ((max_threshold - min_threshold) / step + 1e-9).floor() as usize;
        (0..=steps)
            .map(|i| ((min_threshold + i as f64 * step) * 1e6).round() / 1e6)
            .collect()
    }

    /// Metric value with `probability >= threshold` counted as a match.
    pub fn evaluate(&self, y_true: &[u8], y_proba: &[f64], threshold: f64) -> f64 {
        self.config
            .metric
            .score(&ConfusionMatrix::at_threshold(y_true, y_proba, threshold))
    }

    /// Returns the lowest threshold reaching the best metric value.
    pub fn tune(&self, y_true: &[u8], y_proba: &[f64]) -> TuningResult {
        let candidates = self.candidates();
        let mut best_threshold = candidates.first().copied().unwrap_or(0.5);
        let mut best_score = f64::NEG_INFINITY;

        for &threshold in &candidates {
            let score = self.evaluate(y_true, y_proba, threshold);
            if score > best_score {
                best_score = score;
                best_threshold = threshold;
            }
        }

        debug!(
            metric = self.config.metric.as_str(),
            threshold = best_threshold,
            score = best_score,
            candidates = candidates.len(),
            "Threshold tuned"
        );

        TuningResult {
            threshold: best_threshold,
            score: best_score.max(0.0),
            metric: self.config.metric,
            candidates: candidates.len(),
        }
    }
}
