use std::sync::Arc;

use super::*;
use crate::embedding::{MockEmbeddingBackend, SemanticEmbedder};
use crate::features::{FeatureExtractor, MatchingStore};
use crate::model::{ModelPredictor, fallback_score};

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn heuristic_matcher() -> HybridMatcher {
    HybridMatcher::new(
        Arc::new(FeatureExtractor::default()),
        Arc::new(SemanticEmbedder::fallback_only()),
        Arc::new(ModelPredictor::unavailable()),
    )
}

#[test]
fn test_combine_redistributes_absent_semantic() {
    let combiner = ScoreCombiner::default();
    let score = combiner.combine(0.8, 0.6, None);
    assert!(approx_eq(score, 0.8 * 3.0 / 7.0 + 0.6 * 4.0 / 7.0));
    assert!((score - 0.686).abs() < 1e-3);
}

#[test]
fn test_combine_zero_semantic_is_a_real_score() {
    let combiner = ScoreCombiner::default();
    let absent = combiner.combine(0.8, 0.6, None);
    let zero = combiner.combine(0.8, 0.6, Some(0.0));
    assert!(approx_eq(zero, 0.3 * 0.8 + 0.4 * 0.6));
    assert!(zero < absent);

    // The legacy sentinel still means "absent".
    assert_eq!(semantic_from_sentinel(0.0), None);
    assert_eq!(semantic_from_sentinel(0.4), Some(0.4));
    assert!(approx_eq(
        combiner.combine(0.8, 0.6, semantic_from_sentinel(0.0)),
        absent
    ));
}

#[test]
fn test_combine_normalizes_by_weight_sum() {
    let combiner = ScoreCombiner::new(CombinerWeights::new(1.0, 1.0, 1.0));
    assert!(approx_eq(combiner.combine(0.9, 0.6, Some(0.3)), 0.6));

    let raw = combiner.with_normalize(false);
    assert_eq!(raw.combine(0.9, 0.6, Some(0.3)), 1.0);
}

#[test]
fn test_combine_output_is_bounded() {
    let weight_sets = [
        CombinerWeights::default(),
        CombinerWeights::new(2.0, 0.5, 0.0),
        CombinerWeights::new(0.0, 0.0, 1.0),
        CombinerWeights::from_ml_weight(0.7),
    ];
    let values = [0.0, 0.25, 0.5, 1.0];

    for weights in weight_sets {
        for normalize in [true, false] {
            for &rule in &values {
                for &ml in &values {
                    for semantic in [None, Some(0.0), Some(0.7), Some(1.0)] {
                        let score = combine(rule, ml, semantic, weights, normalize);
                        assert!(
                            (0.0..=1.0).contains(&score),
                            "{score} out of range for {weights:?}"
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn test_legacy_two_way_weights() {
    let weights = CombinerWeights::from_ml_weight(0.7);
    assert!(approx_eq(weights.rule, 0.3));
    assert_eq!(weights.semantic, 0.0);

    let score = ScoreCombiner::new(weights).combine(0.5, 1.0, None);
    assert!(approx_eq(score, 0.3 * 0.5 + 0.7));
}

#[test]
fn test_redistribution_with_only_semantic_weight() {
    let weights = CombinerWeights::new(0.0, 0.0, 1.0).redistributed();
    assert!(approx_eq(weights.rule, 0.5));
    assert!(approx_eq(weights.ml, 0.5));
    assert_eq!(weights.semantic, 0.0);
}

#[test]
fn test_evaluate_identical_pair() {
    let matcher = heuristic_matcher();
    let outcome = matcher.evaluate("велосипед горный", "велосипед горный", "спорт", "спорт", None);

    assert!(outcome.is_valid);
    assert!(outcome.is_match);
    assert!(approx_eq(outcome.total_score, 1.0));
    assert!(approx_eq(outcome.components.rule.category_weight, 1.0));
    assert_eq!(outcome.components.semantic_score, Some(1.0));
    assert_eq!(outcome.components.features.exact_match, 1.0);
}

#[test]
fn test_evaluate_unrelated_pair() {
    let matcher = heuristic_matcher();
    let outcome = matcher.evaluate("велосипед горный", "диван угловой", "спорт", "мебель", None);

    assert!(!outcome.is_match);
    assert!(approx_eq(outcome.components.rule.category_weight, 0.1));
    assert!(approx_eq(outcome.components.ml_score, 0.3 * 0.1));
    assert!(approx_eq(outcome.total_score, 0.4 * 0.03));
}

#[test]
fn test_ml_score_is_heuristic_without_model() {
    let matcher = heuristic_matcher();
    let outcome = matcher.evaluate("ноутбук игровой", "ноутбук", "электроника", "электроника", Some(0.6));
    let features = outcome.components.features.to_map();
    assert!(approx_eq(outcome.components.ml_score, fallback_score(&features)));
    assert_eq!(outcome.components.rule.base, 0.6);
}

#[test]
fn test_evaluate_infers_missing_categories() {
    let matcher = heuristic_matcher();
    let outcome = matcher.evaluate("горный велосипед", "велосипед детский", "", "  ", None);

    assert_eq!(outcome.category1, "спорт");
    assert_eq!(outcome.category2, "спорт");
    assert!(approx_eq(outcome.components.rule.category_weight, 1.0));

    let unknown = matcher.evaluate("что-нибудь", "велосипед", "", "", None);
    assert_eq!(unknown.category1, "");
    assert_eq!(unknown.category2, "спорт");
    assert!(approx_eq(unknown.components.rule.category_weight, 0.5));
}

#[test]
fn test_without_semantic_redistributes() {
    let matcher = heuristic_matcher().without_semantic();
    let outcome = matcher.evaluate("велосипед горный", "велосипед", "спорт", "спорт", None);

    assert_eq!(outcome.components.semantic_score, None);
    let expected = matcher.combiner().combine(
        outcome.components.rule.total,
        outcome.components.ml_score,
        None,
    );
    assert!(approx_eq(outcome.total_score, expected));
}

#[test]
fn test_evaluate_batch_matches_single() {
    let backend = Arc::new(
        MockEmbeddingBackend::new()
            .with_vector("велосипед горный", vec![1.0, 0.0])
            .with_vector("велосипед", vec![0.6, 0.8])
            .with_vector("гитара", vec![0.0, 1.0]),
    );
    let matcher = HybridMatcher::new(
        Arc::new(FeatureExtractor::default()),
        Arc::new(SemanticEmbedder::new(backend.clone())),
        Arc::new(ModelPredictor::unavailable()),
    );

    let requests = vec![
        MatchRequest::new("велосипед горный", "велосипед", "спорт", "спорт"),
        MatchRequest::new("велосипед горный", "гитара", "спорт", "музыка").with_base_score(0.2),
    ];
    let batch = matcher.evaluate_batch(&requests);
    assert_eq!(backend.calls(), 1);

    for (request, outcome) in requests.iter().zip(&batch) {
        let single = matcher.evaluate_request(request);
        assert_eq!(&single, outcome);
    }
    let semantic = batch[0].components.semantic_score.expect("semantic");
    assert!((semantic - 0.6).abs() < 1e-6);
    assert!(matcher.evaluate_batch(&[]).is_empty());
}

#[test]
fn test_decision_threshold() {
    let request = MatchRequest::new("велосипед горный", "велосипед", "спорт", "спорт");
    let score = heuristic_matcher().evaluate_request(&request).total_score;

    let strict = heuristic_matcher().with_decision_threshold(score + 0.01);
    assert!(!strict.evaluate_request(&request).is_match);
    let lenient = heuristic_matcher().with_decision_threshold(score);
    assert!(lenient.evaluate_request(&request).is_match);
}

#[test]
fn test_record_pair_appends_to_store() {
    let matcher = heuristic_matcher();
    let mut store = MatchingStore::in_memory();
    let request = MatchRequest::new("гитара акустическая", "гитара", "музыка", "музыка");

    let outcome = matcher.record_pair(&mut store, &request).expect("record");
    let record = store.get(&outcome.pair_id).expect("stored");

    assert_eq!(record.text1, "гитара акустическая");
    assert_eq!(record.features, outcome.components.features);
    assert_eq!(record.semantic_similarity, outcome.components.semantic_score);
    assert!(!record.is_labeled());
}

#[tokio::test]
async fn test_evaluate_blocking_offload() {
    let matcher = Arc::new(heuristic_matcher());
    let request = MatchRequest::new("велосипед горный", "велосипед горный", "спорт", "спорт");

    let outcome = matcher
        .evaluate_blocking_offload(request.clone())
        .await
        .expect("offload");
    assert_eq!(outcome, matcher.evaluate_request(&request));
}
