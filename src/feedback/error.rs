use std::path::PathBuf;
use thiserror::Error;

use crate::features::StoreError;
use crate::training::TrainingError;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("I/O error on feedback log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize feedback entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("retraining failed: {0}")]
    Training(#[from] TrainingError),
}

impl FeedbackError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        FeedbackError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type FeedbackResult<T> = Result<T, FeedbackError>;
