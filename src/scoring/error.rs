use thiserror::Error;

use crate::features::StoreError;
use crate::rules::RulesError;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("rule configuration error: {0}")]
    Rules(#[from] RulesError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("blocking evaluation task failed: {0}")]
    Offload(#[from] tokio::task::JoinError),
}
