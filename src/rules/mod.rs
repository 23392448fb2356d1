//! Deterministic rule-based scoring.
//!
//! - [`CategoryFilter`] weighs category compatibility and runs the subset-overlap check.
//! - [`ContextualKeywords`] scores keyword context between two texts.
//! - [`MorphologyProcessor`] optionally lemmatizes (identity when no backend is configured).
//! - [`RuleBasedMatcher`] combines them into a [`RuleScore`].
//!
//! All scoring here is pure and safe to call from any thread.

pub mod category;
pub mod error;
pub mod keywords;
pub mod matcher;
pub mod morphology;
pub mod text;

#[cfg(test)]
mod tests;

pub use category::{CategoryConfig, CategoryFilter};
pub use error::{RulesError, RulesResult};
pub use keywords::ContextualKeywords;
pub use matcher::{RuleBasedMatcher, RuleScore};
pub use morphology::{DictionaryLemmatizer, Lemmatizer, MorphologyProcessor};
pub use text::{normalize, word_set};
