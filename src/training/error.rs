use thiserror::Error;

use crate::features::StoreError;
use crate::model::ModelError;

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("insufficient labeled samples: need {required}, have {available}")]
    InsufficientSamples { required: usize, available: usize },

    #[error("imbalanced labels: positive ratio {ratio:.3} outside [{min}, {max}]")]
    ImbalancedLabels { ratio: f64, min: f64, max: f64 },

    #[error("invalid training data: {reason}")]
    InvalidData { reason: String },

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

pub type TrainingResult<T> = Result<T, TrainingError>;
