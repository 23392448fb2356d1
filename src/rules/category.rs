use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::{
    DEFAULT_MIN_OVERLAP, MISMATCHED_CATEGORY_WEIGHT, SAME_CATEGORY_WEIGHT, UNKNOWN_CATEGORY_WEIGHT,
};

use super::error::{RulesError, RulesResult, read_json};
use super::text::{normalize, word_set};

fn default_category_weight() -> f64 {
    1.0
}

/// A configured catalogue category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    /// Catalogue metadata in `[0, 1]`, serialized with the category.
    /// [`CategoryFilter::weight`] does not read it: pairwise weights come
    /// only from identity and whether both names are configured.
    #[serde(default = "default_category_weight")]
    pub weight: f64,
    #[serde(default)]
    pub key_terms: BTreeSet<String>,
}

impl CategoryConfig {
    pub fn new<I, S>(name: &str, key_terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            weight: default_category_weight(),
            key_terms: key_terms.into_iter().map(Into::into).collect(),
        }
    }
}

/// Category compatibility and the permissive subset-overlap validity check.
///
/// Category names are compared trimmed and lowercased. The set of configured
/// categories is fixed at construction.
#[derive(Debug, Clone)]
pub struct CategoryFilter {
    categories: HashMap<String, CategoryConfig>,
    order: Vec<String>,
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl CategoryFilter {
    pub fn new(configs: Vec<CategoryConfig>) -> RulesResult<Self> {
        let mut categories = HashMap::with_capacity(configs.len());
        let mut order = Vec::with_capacity(configs.len());

        for mut config in configs {
            let key = canonical(&config.name);
            if key.is_empty() {
                return Err(RulesError::InvalidCategory {
                    reason: "category name cannot be empty".to_string(),
                });
            }
            if !(0.0..=1.0).contains(&config.weight) {
                return Err(RulesError::InvalidCategory {
                    reason: format!("weight for '{}' must be in [0, 1], got {}", key, config.weight),
                });
            }
            config.key_terms = config.key_terms.iter().map(|t| normalize(t)).collect();
            if categories.insert(key.clone(), config).is_some() {
                return Err(RulesError::InvalidCategory {
                    reason: format!("duplicate category '{}'", key),
                });
            }
            order.push(key);
        }

        Ok(Self { categories, order })
    }

    /// Built-in catalogue used when no category file is configured.
    pub fn with_defaults() -> Self {
        let defaults = vec![
            CategoryConfig::new(
                "электроника",
                ["телефон", "смартфон", "ноутбук", "планшет", "наушники", "телевизор", "камера", "компьютер"],
            ),
            CategoryConfig::new(
                "мебель",
                ["диван", "стол", "стул", "шкаф", "кровать", "кресло", "комод", "полка"],
            ),
            CategoryConfig::new(
                "одежда",
                ["куртка", "пальто", "платье", "джинсы", "обувь", "кроссовки", "свитер", "рубашка"],
            ),
            CategoryConfig::new(
                "спорт",
                ["велосипед", "самокат", "лыжи", "коньки", "гантели", "мяч", "тренажер", "палатка"],
            ),
            CategoryConfig::new(
                "книги",
                ["книга", "роман", "учебник", "журнал", "энциклопедия", "комикс"],
            ),
            CategoryConfig::new(
                "детские товары",
                ["коляска", "игрушка", "автокресло", "конструктор", "кроватка"],
            ),
            CategoryConfig::new(
                "бытовая техника",
                ["холодильник", "пылесос", "микроволновка", "чайник", "утюг", "стиральная"],
            ),
            CategoryConfig::new(
                "инструменты",
                ["дрель", "перфоратор", "шуруповерт", "пила", "молоток", "болгарка"],
            ),
            CategoryConfig::new(
                "музыка",
                ["гитара", "синтезатор", "пианино", "скрипка", "барабаны", "укулеле"],
            ),
        ];

        // Built-in names are unique and non-empty.
        let mut categories = HashMap::with_capacity(defaults.len());
        let mut order = Vec::with_capacity(defaults.len());
        for config in defaults {
            let key = canonical(&config.name);
            order.push(key.clone());
            categories.insert(key, config);
        }
        Self { categories, order }
    }

    /// Loads a JSON list of [`CategoryConfig`].
    pub fn from_json_file(path: &Path) -> RulesResult<Self> {
        let configs: Vec<CategoryConfig> = read_json(path)?;
        let filter = Self::new(configs)?;
        info!(
            path = %path.display(),
            categories = filter.len(),
            "Loaded category configuration"
        );
        Ok(filter)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_known(&self, category: &str) -> bool {
        self.categories.contains_key(&canonical(category))
    }

    pub fn get(&self, category: &str) -> Option<&CategoryConfig> {
        self.categories.get(&canonical(category))
    }

    /// Configured categories in load order.
    pub fn categories(&self) -> impl Iterator<Item = &CategoryConfig> {
        self.order.iter().filter_map(|key| self.categories.get(key))
    }

    /// Identical → 1.0, both known and distinct → 0.1, otherwise 0.5.
    pub fn weight(&self, category_a: &str, category_b: &str) -> f64 {
        let a = canonical(category_a);
        let b = canonical(category_b);

        if a == b {
            return SAME_CATEGORY_WEIGHT;
        }

        if self.categories.contains_key(&a) && self.categories.contains_key(&b) {
            return MISMATCHED_CATEGORY_WEIGHT;
        }

        UNKNOWN_CATEGORY_WEIGHT
    }

    pub fn filter(&self, score: f64, category_a: &str, category_b: &str) -> f64 {
        score * self.weight(category_a, category_b)
    }

    /// Validity check with the default minimum overlap.
    pub fn is_valid(text_a: &str, text_b: &str) -> bool {
        Self::is_valid_with_overlap(text_a, text_b, DEFAULT_MIN_OVERLAP)
    }

    /// A pair is invalid only when one word set is a strict subset of the
    /// other and their overlap relative to the smaller set is below
    /// `min_overlap`. Every other shape of pair is valid.
    pub fn is_valid_with_overlap(text_a: &str, text_b: &str, min_overlap: f64) -> bool {
        let words_a = word_set(text_a);
        let words_b = word_set(text_b);

        let strict_subset = (words_a.len() < words_b.len() && words_a.is_subset(&words_b))
            || (words_b.len() < words_a.len() && words_b.is_subset(&words_a));

        if !strict_subset {
            return true;
        }

        let smaller = words_a.len().min(words_b.len());
        let overlap = if smaller == 0 {
            0.0
        } else {
            words_a.intersection(&words_b).count() as f64 / smaller as f64
        };

        if overlap < min_overlap {
            debug!(overlap, min_overlap, "Pair rejected by subset overlap check");
            return false;
        }
        true
    }

    /// Returns the configured category with the most key-term hits in `text`.
    /// Ties resolve to the category configured first.
    pub fn infer_category(&self, text: &str) -> Option<&str> {
        let normalized = normalize(text);
        let words = word_set(&normalized);
        if words.is_empty() {
            return None;
        }

        let mut best: Option<(&CategoryConfig, usize)> = None;
        for config in self.categories() {
            let hits = config
                .key_terms
                .iter()
                .filter(|term| {
                    if term.contains(' ') {
                        normalized.contains(term.as_str())
                    } else {
                        words.contains(term.as_str())
                    }
                })
                .count();

            if hits > 0 && best.is_none_or(|(_, best_hits)| hits > best_hits) {
                best = Some((config, hits));
            }
        }

        best.map(|(config, _)| config.name.as_str())
    }
}

fn canonical(category: &str) -> String {
    category.trim().to_lowercase()
}
