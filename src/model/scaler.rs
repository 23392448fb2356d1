use serde::{Deserialize, Serialize};

use super::error::{ModelError, ModelResult};

/// Per-feature standardization: `(x - mean) / scale`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Fits on `rows`. Constant columns get a scale of 1.0.
    pub fn fit(rows: &[Vec<f64>]) -> ModelResult<Self> {
        let Some(first) = rows.first() else {
            return Err(ModelError::InvalidInput {
                reason: "cannot fit scaler on zero rows".to_string(),
            });
        };
        let width = first.len();
        if let Some(bad) = rows.iter().find(|row| row.len() != width) {
            return Err(ModelError::InvalidInput {
                reason: format!("row width {} differs from {}", bad.len(), width),
            });
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut variance = vec![0.0; width];
        for row in rows {
            for ((v, x), m) in variance.iter_mut().zip(row).zip(&mean) {
                *v += (x - m).powi(2);
            }
        }

        let scale = variance
            .into_iter()
            .map(|v| {
                let std = (v / n).sqrt();
                if std > f64::EPSILON { std } else { 1.0 }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardizes a row; extra trailing values are dropped, missing ones read as 0.0.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        self.mean
            .iter()
            .zip(&self.scale)
            .enumerate()
            .map(|(i, (m, s))| (row.get(i).copied().unwrap_or(0.0) - m) / s)
            .collect()
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform(row)).collect()
    }
}
