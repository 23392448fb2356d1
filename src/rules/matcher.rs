use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{DEFAULT_MIN_OVERLAP, INVALID_PAIR_PENALTY, KEYWORD_BONUS_FACTOR};

use super::category::CategoryFilter;
use super::keywords::ContextualKeywords;
use super::morphology::MorphologyProcessor;
use super::text::normalize;

/// Breakdown of a deterministic rule-based score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleScore {
    /// Caller-supplied base score.
    pub base: f64,
    /// Category compatibility weight.
    pub category_weight: f64,
    /// Contextual keyword bonus (similarity × 0.1).
    pub keyword_bonus: f64,
    /// Result of the subset-overlap validity check.
    pub is_valid: bool,
    /// Final score, capped at 1.0.
    pub total: f64,
}

/// Deterministic scorer combining category weight, keyword context and validity.
#[derive(Debug, Clone)]
pub struct RuleBasedMatcher {
    categories: CategoryFilter,
    keywords: ContextualKeywords,
    morphology: MorphologyProcessor,
    min_overlap: f64,
    lemmatize: bool,
}

impl Default for RuleBasedMatcher {
    fn default() -> Self {
        Self::new(
            CategoryFilter::with_defaults(),
            ContextualKeywords::new(),
            MorphologyProcessor::Identity,
        )
    }
}

impl RuleBasedMatcher {
    pub fn new(
        categories: CategoryFilter,
        keywords: ContextualKeywords,
        morphology: MorphologyProcessor,
    ) -> Self {
        let lemmatize = morphology.has_backend();
        Self {
            categories,
            keywords,
            morphology,
            min_overlap: DEFAULT_MIN_OVERLAP,
            lemmatize,
        }
    }

    pub fn with_min_overlap(mut self, min_overlap: f64) -> Self {
        self.min_overlap = min_overlap;
        self
    }

    pub fn with_lemmatization(mut self, enabled: bool) -> Self {
        self.lemmatize = enabled;
        self
    }

    pub fn categories(&self) -> &CategoryFilter {
        &self.categories
    }

    pub fn keywords(&self) -> &ContextualKeywords {
        &self.keywords
    }

    pub fn morphology(&self) -> &MorphologyProcessor {
        &self.morphology
    }

    /// Normalizes text and lemmatizes it when enabled.
    pub fn preprocess(&self, text: &str) -> String {
        let normalized = normalize(text);
        if self.lemmatize {
            self.morphology.lemma_text(&normalized)
        } else {
            normalized
        }
    }

    pub fn score(
        &self,
        text1: &str,
        text2: &str,
        category1: &str,
        category2: &str,
        base: f64,
    ) -> RuleScore {
        let norm1 = self.preprocess(text1);
        let norm2 = self.preprocess(text2);
        self.score_normalized(&norm1, &norm2, category1, category2, base)
    }

    /// Same as [`score`](Self::score) for texts already passed through
    /// [`preprocess`](Self::preprocess).
    pub fn score_normalized(
        &self,
        norm1: &str,
        norm2: &str,
        category1: &str,
        category2: &str,
        base: f64,
    ) -> RuleScore {
        let category_weight = self.categories.weight(category1, category2);
        let is_valid = CategoryFilter::is_valid_with_overlap(norm1, norm2, self.min_overlap);
        let keyword_bonus = self.keywords.similarity(norm1, norm2) * KEYWORD_BONUS_FACTOR;

        let mut total = base * category_weight + keyword_bonus;
        if !is_valid {
            total *= INVALID_PAIR_PENALTY;
        }
        let total = total.min(1.0);

        debug!(
            base,
            category_weight,
            keyword_bonus,
            is_valid,
            total,
            "Rule-based score computed"
        );

        RuleScore {
            base,
            category_weight,
            keyword_bonus,
            is_valid,
            total,
        }
    }
}
