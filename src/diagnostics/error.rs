use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiagnosticsError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize diagnostics output: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl DiagnosticsError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        DiagnosticsError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type DiagnosticsResult<T> = Result<T, DiagnosticsError>;
