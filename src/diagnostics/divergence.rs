use std::cmp::Ordering;

use serde::Serialize;

use crate::features::MatchingRecord;

/// Number of equal-width histogram buckets over `[0, 1]`.
pub const HISTOGRAM_BUCKETS: usize = 10;

/// A pair whose rule-based and semantic scores disagree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outlier {
    pub pair_id: String,
    pub text1: String,
    pub text2: String,
    pub category1: String,
    pub category2: String,
    pub rule_score: f64,
    pub semantic_score: f64,
    /// `|rule_score - semantic_score|`.
    pub divergence: f64,
    pub is_match: Option<bool>,
}

impl Outlier {
    pub fn new(record: &MatchingRecord, rule_score: f64, semantic_score: f64) -> Self {
        Self {
            pair_id: record.pair_id.clone(),
            text1: record.text1.clone(),
            text2: record.text2.clone(),
            category1: record.category1.clone(),
            category2: record.category2.clone(),
            rule_score,
            semantic_score,
            divergence: (rule_score - semantic_score).abs(),
            is_match: record.is_match,
        }
    }
}

/// Sorts by divergence, largest first.
pub(crate) fn sort_by_divergence(outliers: &mut [Outlier]) {
    outliers.sort_by(|a, b| {
        b.divergence
            .partial_cmp(&a.divergence)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.pair_id.cmp(&b.pair_id))
    });
}

/// Summary of divergence values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivergenceDistribution {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub p90: f64,
    pub max: f64,
    /// Counts per bucket of width 0.1; the last bucket includes 1.0.
    pub histogram: [usize; HISTOGRAM_BUCKETS],
}

impl DivergenceDistribution {
    /// Non-finite values are dropped; the rest are clamped to `[0, 1]`.
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values
            .iter()
            .filter(|v| v.is_finite())
            .map(|v| v.clamp(0.0, 1.0))
            .collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        let mut histogram = [0; HISTOGRAM_BUCKETS];
        for &value in &sorted {
            let bucket = ((value * HISTOGRAM_BUCKETS as f64) as usize).min(HISTOGRAM_BUCKETS - 1);
            histogram[bucket] += 1;
        }

        let count = sorted.len();
        if count == 0 {
            return Self {
                count,
                mean: 0.0,
                median: 0.0,
                p90: 0.0,
                max: 0.0,
                histogram,
            };
        }

        let median = if count % 2 == 0 {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        } else {
            sorted[count / 2]
        };
        // Nearest-rank percentile.
        let p90_rank = ((0.9 * count as f64).ceil() as usize).clamp(1, count);

        Self {
            count,
            mean: sorted.iter().sum::<f64>() / count as f64,
            median,
            p90: sorted[p90_rank - 1],
            max: sorted[count - 1],
            histogram,
        }
    }
}
