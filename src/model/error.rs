use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize {path}: {source}")]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("model bundle at {path} is incomplete: missing {component}")]
    MissingComponent { path: PathBuf, component: &'static str },

    #[error("model bundle is inconsistent: {reason}")]
    Inconsistent { reason: String },

    #[error("no active model version under {root}")]
    NoActiveVersion { root: PathBuf },

    #[error("no model directory configured")]
    NotConfigured,

    #[error("invalid training input: {reason}")]
    InvalidInput { reason: String },
}

impl ModelError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ModelError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn serde(path: &std::path::Path, source: serde_json::Error) -> Self {
        ModelError::Serialization {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
