use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{ModelError, ModelResult};

/// Weights and bias of a linear decision function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearModel {
    fn zeros(width: usize) -> Self {
        Self {
            weights: vec![0.0; width],
            bias: 0.0,
        }
    }

    pub fn decision(&self, x: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(x)
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.bias
    }
}

/// Classifier family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    /// Logistic regression; exposes probabilities.
    #[default]
    LogisticRegression,
    /// Hinge-loss linear SVM; decision function only.
    LinearSvm,
}

impl ClassifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassifierKind::LogisticRegression => "logistic_regression",
            ClassifierKind::LinearSvm => "linear_svm",
        }
    }
}

impl std::str::FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "logistic_regression" | "logistic" | "lr" => Ok(Self::LogisticRegression),
            "linear_svm" | "svm" => Ok(Self::LinearSvm),
            other => Err(format!("unknown classifier: {other}")),
        }
    }
}

/// Gradient-descent hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitParams {
    pub learning_rate: f64,
    pub epochs: usize,
    pub l2: f64,
    /// Weight samples inversely to class frequency.
    pub balanced: bool,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 500,
            l2: 1e-3,
            balanced: true,
        }
    }
}

/// A fitted binary classifier over standardized features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_type", rename_all = "snake_case")]
pub enum Classifier {
    LogisticRegression(LinearModel),
    LinearSvm(LinearModel),
}

impl Classifier {
    pub fn kind(&self) -> ClassifierKind {
        match self {
            Classifier::LogisticRegression(_) => ClassifierKind::LogisticRegression,
            Classifier::LinearSvm(_) => ClassifierKind::LinearSvm,
        }
    }

    fn linear(&self) -> &LinearModel {
        match self {
            Classifier::LogisticRegression(model) | Classifier::LinearSvm(model) => model,
        }
    }

    pub fn n_features(&self) -> usize {
        self.linear().weights.len()
    }

    pub fn supports_probability(&self) -> bool {
        matches!(self, Classifier::LogisticRegression(_))
    }

    pub fn decision_function(&self, x: &[f64]) -> f64 {
        self.linear().decision(x)
    }

    /// Positive-class probability, when the family has one.
    pub fn predict_proba(&self, x: &[f64]) -> Option<f64> {
        match self {
            Classifier::LogisticRegression(model) => Some(sigmoid(model.decision(x))),
            Classifier::LinearSvm(_) => None,
        }
    }

    /// Binary decision. Probabilistic models compare against `threshold`;
    /// margin models use the sign of the decision function.
    pub fn predict(&self, x: &[f64], threshold: f64) -> bool {
        match self.predict_proba(x) {
            Some(p) => p >= threshold,
            None => self.decision_function(x) >= 0.0,
        }
    }

    /// Fits a classifier by full-batch gradient descent. Deterministic for a
    /// given input.
    pub fn fit(
        kind: ClassifierKind,
        rows: &[Vec<f64>],
        labels: &[u8],
        params: &FitParams,
    ) -> ModelResult<Self> {
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(ModelError::InvalidInput {
                reason: format!("{} rows for {} labels", rows.len(), labels.len()),
            });
        }
        let width = rows[0].len();
        let sample_weights = class_weights(labels, params.balanced)?;
        let total_weight: f64 = sample_weights.iter().sum();

        let mut model = LinearModel::zeros(width);
        for epoch in 0..params.epochs {
            let mut grad_w = vec![0.0; width];
            let mut grad_b = 0.0;

            for ((x, &label), &sw) in rows.iter().zip(labels).zip(&sample_weights) {
                let coeff = match kind {
                    ClassifierKind::LogisticRegression => {
                        sw * (sigmoid(model.decision(x)) - f64::from(label))
                    }
                    ClassifierKind::LinearSvm => {
                        let y = if label == 1 { 1.0 } else { -1.0 };
                        if y * model.decision(x) < 1.0 { -sw * y } else { 0.0 }
                    }
                };
                if coeff != 0.0 {
                    for (g, v) in grad_w.iter_mut().zip(x) {
                        *g += coeff * v;
                    }
                    grad_b += coeff;
                }
            }

            let lr = match kind {
                ClassifierKind::LogisticRegression => params.learning_rate,
                ClassifierKind::LinearSvm => params.learning_rate / (1.0 + epoch as f64 * 0.01),
            };
            for (w, g) in model.weights.iter_mut().zip(&grad_w) {
                *w -= lr * (g / total_weight + params.l2 * *w);
            }
            model.bias -= lr * grad_b / total_weight;
        }

        debug!(
            kind = kind.as_str(),
            epochs = params.epochs,
            features = width,
            "Classifier fitted"
        );

        Ok(match kind {
            ClassifierKind::LogisticRegression => Classifier::LogisticRegression(model),
            ClassifierKind::LinearSvm => Classifier::LinearSvm(model),
        })
    }
}

fn class_weights(labels: &[u8], balanced: bool) -> ModelResult<Vec<f64>> {
    let positives = labels.iter().filter(|&&l| l == 1).count();
    let negatives = labels.len() - positives;

    if positives == 0 || negatives == 0 {
        return Err(ModelError::InvalidInput {
            reason: "training labels must contain both classes".to_string(),
        });
    }

    if !balanced {
        return Ok(vec![1.0; labels.len()]);
    }

    let n = labels.len() as f64;
    let w_pos = n / (2.0 * positives as f64);
    let w_neg = n / (2.0 * negatives as f64);
    Ok(labels
        .iter()
        .map(|&l| if l == 1 { w_pos } else { w_neg })
        .collect())
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
