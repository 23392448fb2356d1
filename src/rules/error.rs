use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading rule-engine configuration.
///
/// Scoring itself is infallible; only the optional config files can fail.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid category config: {reason}")]
    InvalidCategory { reason: String },
}

pub type RulesResult<T> = Result<T, RulesError>;

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> RulesResult<T> {
    let content = std::fs::read_to_string(path).map_err(|source| RulesError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| RulesError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
