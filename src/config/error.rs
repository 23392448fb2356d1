//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric environment variable could not be parsed.
    #[error("failed to parse {name}='{value}': {reason}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// A blend weight is negative or not finite.
    #[error("invalid weight {name}={value}: must be a finite, non-negative number")]
    InvalidWeight { name: &'static str, value: f64 },

    /// All blend weights are zero.
    #[error("blend weights must not all be zero")]
    ZeroWeights,

    /// Decision threshold outside `[0, 1]`.
    #[error("invalid decision threshold {value}: must be within [0, 1]")]
    InvalidThreshold { value: f64 },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
