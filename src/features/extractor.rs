use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use crate::constants::{
    CATEGORY_PAIR_PREFIX, FEATURE_SEMANTIC_CENTERED, FEATURE_SEMANTIC_CONFIDENCE,
    FEATURE_SEMANTIC_SIMILARITY,
};
use crate::rules::{RuleBasedMatcher, RuleScore, word_set};

use super::error::{StoreError, StoreResult};
use super::record::MatchingFeatures;

/// Jaccard index of lowercased word sets; 0.0 if either side is empty.
pub fn word_overlap(text1: &str, text2: &str) -> f64 {
    let words1 = word_set(text1);
    let words2 = word_set(text2);

    if words1.is_empty() || words2.is_empty() {
        return 0.0;
    }

    let intersection = words1.intersection(&words2).count();
    let union = words1.union(&words2).count();
    intersection as f64 / union as f64
}

/// `|len1 - len2| / max(len1, len2)` over character counts; 0.0 if both are empty.
pub fn length_diff(text1: &str, text2: &str) -> f64 {
    let len1 = text1.chars().count();
    let len2 = text2.chars().count();
    let max = len1.max(len2);

    if max == 0 {
        return 0.0;
    }

    (len1.abs_diff(len2) as f64 / max as f64).min(1.0)
}

/// Fraction of `pairs` the dictionary considers synonymous; 0.0 for no pairs.
pub fn synonym_ratio(pairs: &[(String, String)], synonyms: &SynonymDictionary) -> f64 {
    if pairs.is_empty() {
        return 0.0;
    }

    let hits = pairs
        .iter()
        .filter(|(a, b)| synonyms.are_synonyms(a, b))
        .count();
    hits as f64 / pairs.len() as f64
}

/// One-hot feature name for an ordered category pair.
pub fn category_pair_feature(category1: &str, category2: &str) -> String {
    format!("{CATEGORY_PAIR_PREFIX}={category1}|{category2}")
}

/// Similarity, a confidence of `min(sim * 1.5, 1)` and the similarity rescaled to `[-1, 1]`.
pub fn semantic_features(similarity: f64) -> [(&'static str, f64); 3] {
    [
        (FEATURE_SEMANTIC_SIMILARITY, similarity),
        (FEATURE_SEMANTIC_CONFIDENCE, (similarity * 1.5).min(1.0)),
        (FEATURE_SEMANTIC_CENTERED, 2.0 * similarity - 1.0),
    ]
}

/// Base features plus the category-pair indicator and, when present, the
/// semantic features. Models ignore keys outside their feature list.
pub fn extended_feature_map(
    features: &MatchingFeatures,
    category1: &str,
    category2: &str,
    semantic: Option<f64>,
) -> HashMap<String, f64> {
    let mut map = features.to_map();
    map.insert(category_pair_feature(category1, category2), 1.0);
    if let Some(similarity) = semantic {
        for (name, value) in semantic_features(similarity) {
            map.insert(name.to_string(), value);
        }
    }
    map
}

/// Groups of interchangeable words.
#[derive(Debug, Clone, Default)]
pub struct SynonymDictionary {
    group_of: HashMap<String, usize>,
}

impl SynonymDictionary {
    pub fn from_groups<G, W>(groups: G) -> Self
    where
        G: IntoIterator<Item = W>,
        W: IntoIterator,
        W::Item: AsRef<str>,
    {
        let mut group_of = HashMap::new();
        for (idx, group) in groups.into_iter().enumerate() {
            for word in group {
                group_of.insert(word.as_ref().to_lowercase(), idx);
            }
        }
        Self { group_of }
    }

    /// Built-in barter vocabulary.
    pub fn with_defaults() -> Self {
        Self::from_groups([
            vec!["телефон", "смартфон", "мобильник", "айфон"],
            vec!["ноутбук", "лэптоп", "ноут"],
            vec!["велосипед", "велик", "байк"],
            vec!["диван", "софа", "кушетка"],
            vec!["кроссовки", "кеды", "сникеры"],
            vec!["куртка", "пуховик", "парка"],
            vec!["телевизор", "тв", "телик"],
            vec!["шуруповерт", "дрель", "винтоверт"],
            vec!["коляска", "прогулка", "люлька"],
            vec!["книга", "книжка", "издание"],
        ])
    }

    /// Loads a JSON list of word lists.
    pub fn from_json_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        let groups: Vec<Vec<String>> =
            serde_json::from_str(&content).map_err(|e| StoreError::Synonyms {
                reason: format!("{}: {}", path.display(), e),
            })?;
        Ok(Self::from_groups(groups))
    }

    pub fn are_synonyms(&self, a: &str, b: &str) -> bool {
        let a = a.to_lowercase();
        let b = b.to_lowercase();
        if a == b {
            return true;
        }
        match (self.group_of.get(&a), self.group_of.get(&b)) {
            (Some(ga), Some(gb)) => ga == gb,
            _ => false,
        }
    }
}

/// Builds the canonical [`MatchingFeatures`] for a pair.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    matcher: Arc<RuleBasedMatcher>,
    synonyms: SynonymDictionary,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(Arc::new(RuleBasedMatcher::default()))
    }
}

impl FeatureExtractor {
    pub fn new(matcher: Arc<RuleBasedMatcher>) -> Self {
        Self {
            matcher,
            synonyms: SynonymDictionary::with_defaults(),
        }
    }

    pub fn with_synonyms(mut self, synonyms: SynonymDictionary) -> Self {
        self.synonyms = synonyms;
        self
    }

    pub fn matcher(&self) -> &RuleBasedMatcher {
        &self.matcher
    }

    /// Scores the pair with the rule engine and derives the feature vector.
    ///
    /// Without a `base_score` the base is the word overlap of the normalized texts.
    pub fn extract(
        &self,
        text1: &str,
        text2: &str,
        category1: &str,
        category2: &str,
        base_score: Option<f64>,
    ) -> (MatchingFeatures, RuleScore) {
        let norm1 = self.matcher.preprocess(text1);
        let norm2 = self.matcher.preprocess(text2);

        let overlap = word_overlap(&norm1, &norm2);
        let base = base_score.unwrap_or(overlap);
        let rule = self
            .matcher
            .score_normalized(&norm1, &norm2, category1, category2, base);

        let pairs = self.candidate_synonym_pairs(&norm1, &norm2);

        let features = MatchingFeatures {
            equivalence_score: rule.total,
            category_match: rule.category_weight,
            word_overlap: overlap,
            length_diff: length_diff(&norm1, &norm2),
            synonym_ratio: synonym_ratio(&pairs, &self.synonyms),
            keyword_similarity: self.matcher.keywords().similarity(&norm1, &norm2),
            is_valid: if rule.is_valid { 1.0 } else { 0.0 },
            exact_match: if !norm1.is_empty() && norm1 == norm2 { 1.0 } else { 0.0 },
        };

        (features, rule)
    }

    /// Cross product of the keywords each side does not share literally.
    fn candidate_synonym_pairs(&self, norm1: &str, norm2: &str) -> Vec<(String, String)> {
        let keywords = self.matcher.keywords();
        let left: HashSet<String> = keywords.extract(norm1).into_iter().collect();
        let right: HashSet<String> = keywords.extract(norm2).into_iter().collect();

        let mut pairs = Vec::new();
        for a in left.difference(&right) {
            for b in right.difference(&left) {
                pairs.push((a.clone(), b.clone()));
            }
        }
        pairs
    }
}
