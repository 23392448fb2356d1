//! Score blending and the hybrid matching pipeline.
//!
//! [`ScoreCombiner`] blends the rule, ML and semantic scores. [`HybridMatcher`] runs a
//! pair through every stage and returns a [`MatchOutcome`] with the blended score,
//! the validity flag, the decision and the per-stage components.

pub mod combiner;
pub mod engine;
pub mod error;
pub mod types;

#[cfg(test)]
mod tests;

pub use combiner::{CombinerWeights, ScoreCombiner, combine, semantic_from_sentinel};
pub use engine::HybridMatcher;
pub use error::ScoringError;
pub use types::{MatchOutcome, MatchRequest, ScoreComponents};
