use serde::{Deserialize, Serialize};

/// A pair with a known expected decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyCase {
    pub text1: String,
    pub text2: String,
    #[serde(default)]
    pub category1: String,
    #[serde(default)]
    pub category2: String,
    pub expected_match: bool,
}

impl ConsistencyCase {
    pub fn new(
        text1: impl Into<String>,
        text2: impl Into<String>,
        category1: impl Into<String>,
        category2: impl Into<String>,
        expected_match: bool,
    ) -> Self {
        Self {
            text1: text1.into(),
            text2: text2.into(),
            category1: category1.into(),
            category2: category2.into(),
            expected_match,
        }
    }
}

/// Built-in barter pairs used when the caller supplies none.
pub fn default_cases() -> Vec<ConsistencyCase> {
    vec![
        ConsistencyCase::new("велосипед горный", "горный велосипед", "спорт", "спорт", true),
        ConsistencyCase::new("смартфон samsung", "телефон samsung", "электроника", "электроника", true),
        ConsistencyCase::new("диван угловой", "угловой диван", "мебель", "мебель", true),
        ConsistencyCase::new("детская коляска", "коляска для ребенка", "детские товары", "детские товары", true),
        ConsistencyCase::new("зимняя куртка", "куртка зимняя мужская", "одежда", "одежда", true),
        ConsistencyCase::new("велосипед", "диван", "спорт", "мебель", false),
        ConsistencyCase::new("ноутбук", "зимняя куртка", "электроника", "одежда", false),
        ConsistencyCase::new("гантели", "детская коляска", "спорт", "детские товары", false),
        ConsistencyCase::new("шкаф для одежды", "смартфон", "мебель", "электроника", false),
    ]
}

/// Scores and decisions for one case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseResult {
    pub case: ConsistencyCase,
    pub rule_score: f64,
    pub semantic_score: f64,
    pub hybrid_score: f64,
    pub rule_match: bool,
    pub semantic_match: bool,
    pub hybrid_match: bool,
}

/// Accuracy of each scorer against the expected decisions, and how often
/// rule and semantic decisions agree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsistencyReport {
    pub total: usize,
    pub rule_accuracy: f64,
    pub semantic_accuracy: f64,
    pub hybrid_accuracy: f64,
    pub rule_semantic_agreement: f64,
    pub mean_divergence: f64,
    pub results: Vec<CaseResult>,
}

impl ConsistencyReport {
    pub fn from_results(results: Vec<CaseResult>) -> Self {
        let total = results.len();
        let share = |predicate: &dyn Fn(&CaseResult) -> bool| {
            if total == 0 {
                0.0
            } else {
                results.iter().filter(|r| predicate(r)).count() as f64 / total as f64
            }
        };

        let rule_accuracy = share(&|r| r.rule_match == r.case.expected_match);
        let semantic_accuracy = share(&|r| r.semantic_match == r.case.expected_match);
        let hybrid_accuracy = share(&|r| r.hybrid_match == r.case.expected_match);
        let rule_semantic_agreement = share(&|r| r.rule_match == r.semantic_match);
        let mean_divergence = if total == 0 {
            0.0
        } else {
            results
                .iter()
                .map(|r| (r.rule_score - r.semantic_score).abs())
                .sum::<f64>()
                / total as f64
        };

        Self {
            total,
            rule_accuracy,
            semantic_accuracy,
            hybrid_accuracy,
            rule_semantic_agreement,
            mean_divergence,
            results,
        }
    }
}
