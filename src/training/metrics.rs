use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

/// Binary confusion counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[u8], y_pred: &[bool]) -> Self {
        let mut matrix = Self::default();
        for (&truth, &predicted) in y_true.iter().zip(y_pred) {
            matrix.record(truth == 1, predicted);
        }
        matrix
    }

    /// Binarizes `scores` with `score >= threshold`.
    pub fn at_threshold(y_true: &[u8], scores: &[f64], threshold: f64) -> Self {
        let predictions: Vec<bool> = scores.iter().map(|&s| s >= threshold).collect();
        Self::from_predictions(y_true, &predictions)
    }

    pub fn record(&mut self, actual: bool, predicted: bool) {
        match (actual, predicted) {
            (true, true) => self.true_positives += 1,
            (false, true) => self.false_positives += 1,
            (false, false) => self.true_negatives += 1,
            (true, false) => self.false_negatives += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }

    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    pub fn f1(&self) -> f64 {
        harmonic_mean(self.precision(), self.recall())
    }

    /// F1 of the negative class.
    pub fn negative_f1(&self) -> f64 {
        let precision = ratio(
            self.true_negatives,
            self.true_negatives + self.false_negatives,
        );
        let recall = ratio(self.true_negatives, self.true_negatives + self.false_positives);
        harmonic_mean(precision, recall)
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn harmonic_mean(a: f64, b: f64) -> f64 {
    if a + b == 0.0 { 0.0 } else { 2.0 * a * b / (a + b) }
}

/// Area under the ROC curve via the rank-sum statistic; ties share the
/// average rank. `None` when only one class is present.
pub fn roc_auc(y_true: &[u8], scores: &[f64]) -> Option<f64> {
    let positives = y_true.iter().filter(|&&y| y == 1).count();
    let negatives = y_true.len() - positives;
    if positives == 0 || negatives == 0 || y_true.len() != scores.len() {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        let average_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = average_rank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = y_true
        .iter()
        .zip(&ranks)
        .filter(|(y, _)| **y == 1)
        .map(|(_, r)| r)
        .sum();
    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

/// Held-out evaluation of a trained classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub threshold: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub accuracy: f64,
    pub roc_auc: Option<f64>,
    pub confusion: ConfusionMatrix,
    pub train_samples: usize,
    pub test_samples: usize,
}

impl EvaluationReport {
    pub fn new(
        confusion: ConfusionMatrix,
        roc_auc: Option<f64>,
        threshold: f64,
        train_samples: usize,
    ) -> Self {
        Self {
            threshold,
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            accuracy: confusion.accuracy(),
            roc_auc,
            test_samples: confusion.total(),
            confusion,
            train_samples,
        }
    }

    /// Flattened for the artifact metadata.
    pub fn to_metrics(&self) -> BTreeMap<String, f64> {
        let mut metrics = BTreeMap::from([
            ("threshold".to_string(), self.threshold),
            ("precision".to_string(), self.precision),
            ("recall".to_string(), self.recall),
            ("f1".to_string(), self.f1),
            ("accuracy".to_string(), self.accuracy),
            ("train_samples".to_string(), self.train_samples as f64),
            ("test_samples".to_string(), self.test_samples as f64),
            ("tp".to_string(), self.confusion.true_positives as f64),
            ("fp".to_string(), self.confusion.false_positives as f64),
            ("tn".to_string(), self.confusion.true_negatives as f64),
            ("fn".to_string(), self.confusion.false_negatives as f64),
        ]);
        if let Some(auc) = self.roc_auc {
            metrics.insert("roc_auc".to_string(), auc);
        }
        metrics
    }
}
