use std::io::Write;
use std::sync::Arc;

use super::*;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_weight_identical_categories() {
    let filter = CategoryFilter::with_defaults();
    assert_eq!(filter.weight("спорт", "спорт"), 1.0);
    assert_eq!(filter.weight("неизвестно", "неизвестно"), 1.0);
    assert_eq!(filter.weight(" Спорт ", "спорт"), 1.0);
}

#[test]
fn test_weight_known_mismatch_is_penalized() {
    let filter = CategoryFilter::with_defaults();
    assert_eq!(filter.weight("электроника", "мебель"), 0.1);
}

#[test]
fn test_weight_unknown_category_is_neutral() {
    let filter = CategoryFilter::with_defaults();
    assert_eq!(filter.weight("электроника", "антиквариат"), 0.5);
    assert_eq!(filter.weight("антиквариат", "марки"), 0.5);
    assert_eq!(filter.weight("", "мебель"), 0.5);
}

#[test]
fn test_weight_is_symmetric() {
    let filter = CategoryFilter::with_defaults();
    let categories = ["электроника", "мебель", "спорт", "антиквариат", ""];
    for a in categories {
        for b in categories {
            assert_eq!(filter.weight(a, b), filter.weight(b, a), "{a} / {b}");
        }
    }
}

#[test]
fn test_filter_multiplies_by_weight() {
    let filter = CategoryFilter::with_defaults();
    assert!(approx_eq(filter.filter(0.8, "электроника", "мебель"), 0.08));
    assert!(approx_eq(filter.filter(0.8, "спорт", "спорт"), 0.8));
}

#[test]
fn test_is_valid_identical_texts() {
    assert!(CategoryFilter::is_valid("велосипед горный", "велосипед горный"));
    assert!(CategoryFilter::is_valid("x", "x"));
}

#[test]
fn test_is_valid_is_permissive_outside_subset_case() {
    assert!(CategoryFilter::is_valid("диван угловой", "гитара акустическая"));
    assert!(CategoryFilter::is_valid("диван угловой", "диван кожаный"));
    assert!(CategoryFilter::is_valid("диван", "диван угловой большой"));
}

#[test]
fn test_is_valid_empty_side_of_strict_subset() {
    assert!(!CategoryFilter::is_valid("", "велосипед"));
    assert!(!CategoryFilter::is_valid("велосипед", ""));
    assert!(CategoryFilter::is_valid("", ""));
}

#[test]
fn test_category_filter_rejects_duplicates() {
    let result = CategoryFilter::new(vec![
        CategoryConfig::new("Спорт", ["мяч"]),
        CategoryConfig::new("спорт", ["лыжи"]),
    ]);
    assert!(matches!(result, Err(RulesError::InvalidCategory { .. })));
}

#[test]
fn test_category_filter_from_json_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("categories.json");
    let mut file = std::fs::File::create(&path).expect("create");
    write!(
        file,
        r#"[{{"name": "Марки", "key_terms": ["марка", "конверт"]}}, {{"name": "Монеты", "weight": 0.8}}]"#
    )
    .expect("write");

    let filter = CategoryFilter::from_json_file(&path).expect("load");
    assert_eq!(filter.len(), 2);
    assert!(filter.is_known("марки"));
    assert_eq!(filter.get("монеты").map(|c| c.weight), Some(0.8));
    assert_eq!(filter.weight("марки", "монеты"), 0.1);
    // The configured weight is metadata; pairwise weights ignore it.
    assert_eq!(filter.weight("монеты", "монеты"), 1.0);
}

#[test]
fn test_category_filter_missing_file() {
    let result = CategoryFilter::from_json_file(std::path::Path::new("/nonexistent/c.json"));
    assert!(matches!(result, Err(RulesError::Io { .. })));
}

#[test]
fn test_infer_category() {
    let filter = CategoryFilter::with_defaults();
    assert_eq!(filter.infer_category("Горный велосипед, почти новый"), Some("спорт"));
    assert_eq!(filter.infer_category("Продам кожаный диван"), Some("мебель"));
    assert_eq!(filter.infer_category("что-то странное"), None);
    assert_eq!(filter.infer_category(""), None);
}

#[test]
fn test_normalize() {
    assert_eq!(normalize("  Велосипед,   ГОРНЫЙ!! "), "велосипед горный");
    assert_eq!(normalize("«Гитара» (акустическая)"), "гитара акустическая");
    assert_eq!(normalize("...!!!"), "");
}

#[test]
fn test_keywords_extract_filters_stop_words() {
    let keywords = ContextualKeywords::new();
    assert_eq!(
        keywords.extract("Меняю велосипед на гитару!"),
        vec!["велосипед".to_string(), "гитару".to_string()]
    );
    assert!(keywords.extract("и в на").is_empty());
}

#[test]
fn test_keywords_weights_are_normalized() {
    let keywords = ContextualKeywords::new();
    let weights = keywords.weights("книга книга роман");
    assert!(approx_eq(weights["книга"], 1.0));
    assert!(approx_eq(weights["роман"], 0.5));
}

#[test]
fn test_keywords_similarity() {
    let keywords = ContextualKeywords::new();
    assert!(approx_eq(keywords.similarity("велосипед горный", "велосипед горный"), 1.0));
    assert!(approx_eq(keywords.similarity("велосипед горный", "велосипед детский"), 1.0 / 3.0));
    assert_eq!(keywords.similarity("велосипед", "и на"), 0.0);
    assert_eq!(keywords.similarity("", "велосипед"), 0.0);
}

#[test]
fn test_keywords_custom_stop_words() {
    let keywords = ContextualKeywords::with_stop_words(["Велосипед"]);
    assert!(keywords.is_stop_word("велосипед"));
    assert_eq!(keywords.extract("велосипед горный"), vec!["горный".to_string()]);
}

#[test]
fn test_morphology_identity_fallback() {
    let morphology = MorphologyProcessor::default();
    assert!(!morphology.has_backend());
    assert_eq!(morphology.lemma("Велосипеды"), "велосипеды");
    assert_eq!(morphology.lemma_text("Горные  Велосипеды"), "горные велосипеды");
    assert_eq!(morphology.backend_name(), "identity");
}

#[test]
fn test_morphology_dictionary_backend() {
    let dictionary = DictionaryLemmatizer::from_pairs([("велосипеды", "велосипед"), ("горные", "горный")]);
    let morphology = MorphologyProcessor::with_backend(Arc::new(dictionary));

    assert!(morphology.has_backend());
    assert_eq!(morphology.lemma("Велосипеды"), "велосипед");
    assert_eq!(morphology.lemma("самокаты"), "самокаты");
    assert_eq!(morphology.lemma_text("горные велосипеды"), "горный велосипед");
}

#[test]
fn test_morphology_from_optional_dictionary() {
    let morphology = MorphologyProcessor::from_optional_dictionary(None).expect("identity");
    assert!(!morphology.has_backend());

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("lemmas.json");
    std::fs::write(&path, r#"{"книги": "книга"}"#).expect("write");
    let morphology = MorphologyProcessor::from_optional_dictionary(Some(&path)).expect("load");
    assert_eq!(morphology.lemma("книги"), "книга");
}

#[test]
fn test_rule_score_identical_pair() {
    let matcher = RuleBasedMatcher::default();
    let score = matcher.score("велосипед горный", "велосипед горный", "спорт", "спорт", 0.8);

    assert_eq!(score.category_weight, 1.0);
    assert!(score.is_valid);
    assert!(score.total >= 0.8);
    assert!(approx_eq(score.keyword_bonus, 0.1));
    assert!(approx_eq(score.total, 0.9));
}

#[test]
fn test_rule_score_is_capped() {
    let matcher = RuleBasedMatcher::default();
    let score = matcher.score("велосипед", "велосипед", "спорт", "спорт", 0.95);
    assert_eq!(score.total, 1.0);
}

#[test]
fn test_rule_score_mismatched_categories() {
    let matcher = RuleBasedMatcher::default();
    let score = matcher.score("ноутбук", "диван", "электроника", "мебель", 0.8);

    assert_eq!(score.category_weight, 0.1);
    assert_eq!(score.keyword_bonus, 0.0);
    assert!(approx_eq(score.total, 0.08));
}

#[test]
fn test_rule_score_invalid_pair_penalty() {
    let matcher = RuleBasedMatcher::default();
    let score = matcher.score("", "велосипед", "спорт", "спорт", 0.5);

    assert!(!score.is_valid);
    assert!(approx_eq(score.total, 0.35));
}

#[test]
fn test_rule_score_is_deterministic() {
    let matcher = RuleBasedMatcher::default();
    let a = matcher.score("Гитара акустическая", "гитара электро", "музыка", "музыка", 0.6);
    let b = matcher.score("Гитара акустическая", "гитара электро", "музыка", "музыка", 0.6);
    assert_eq!(a, b);
}

#[test]
fn test_preprocess_with_lemmatization() {
    let dictionary = DictionaryLemmatizer::from_pairs([("велосипеды", "велосипед")]);
    let matcher = RuleBasedMatcher::new(
        CategoryFilter::with_defaults(),
        ContextualKeywords::new(),
        MorphologyProcessor::with_backend(Arc::new(dictionary)),
    );
    assert_eq!(matcher.preprocess("Велосипеды!"), "велосипед");

    let matcher = matcher.with_lemmatization(false);
    assert_eq!(matcher.preprocess("Велосипеды!"), "велосипеды");
}
