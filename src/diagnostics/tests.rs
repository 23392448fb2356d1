use std::fs;
use std::sync::Arc;

use tempfile::TempDir;

use super::*;
use crate::embedding::{MockEmbeddingBackend, SemanticEmbedder};
use crate::features::{FeatureExtractor, MatchingFeatures, MatchingRecord, MatchingStore};
use crate::model::ModelPredictor;
use crate::scoring::HybridMatcher;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn diagnostics_with(embedder: SemanticEmbedder) -> Diagnostics {
    let matcher = HybridMatcher::new(
        Arc::new(FeatureExtractor::default()),
        Arc::new(embedder),
        Arc::new(ModelPredictor::unavailable()),
    );
    Diagnostics::new(Arc::new(matcher))
}

fn record(id: &str, rule: f64, semantic: Option<f64>, label: Option<bool>) -> MatchingRecord {
    let features = MatchingFeatures {
        equivalence_score: rule,
        ..MatchingFeatures::default()
    };
    let mut record = MatchingRecord::new(id, format!("{id} один"), format!("{id} два"), "", "", features);
    if let Some(similarity) = semantic {
        record = record.with_semantic_similarity(similarity);
    }
    match label {
        Some(is_match) => record.labeled(is_match, None, None),
        None => record,
    }
}

fn store(records: Vec<MatchingRecord>) -> MatchingStore {
    let mut store = MatchingStore::in_memory();
    for record in records {
        store.add(record).expect("add");
    }
    store
}

#[test]
fn test_distribution_empty() {
    let dist = DivergenceDistribution::from_values(&[]);
    assert_eq!(dist.count, 0);
    assert_eq!(dist.mean, 0.0);
    assert_eq!(dist.histogram, [0; HISTOGRAM_BUCKETS]);
}

#[test]
fn test_distribution_statistics() {
    let values = [0.05, 0.15, 0.15, 0.35, 0.95, 1.0, 0.5, 0.55, 0.25, 0.05];
    let dist = DivergenceDistribution::from_values(&values);

    assert_eq!(dist.count, 10);
    assert!(approx_eq(dist.mean, 0.4));
    assert!(approx_eq(dist.median, (0.25 + 0.35) / 2.0));
    assert!(approx_eq(dist.p90, 0.95));
    assert_eq!(dist.max, 1.0);
    assert_eq!(dist.histogram, [2, 2, 1, 1, 0, 2, 0, 0, 0, 2]);
    assert_eq!(dist.histogram.iter().sum::<usize>(), 10);
}

#[test]
fn test_distribution_ignores_non_finite() {
    let dist = DivergenceDistribution::from_values(&[f64::NAN, 0.2, 1.5]);
    assert_eq!(dist.count, 2);
    assert_eq!(dist.max, 1.0);
}

#[test]
fn test_detect_outliers_threshold_and_order() {
    let diagnostics = diagnostics_with(SemanticEmbedder::fallback_only());
    let store = store(vec![
        record("a", 0.9, Some(0.1), Some(true)),
        record("b", 0.5, Some(0.45), Some(false)),
        record("c", 0.2, Some(0.7), Some(true)),
        record("d", 0.9, Some(0.0), None),
    ]);

    let outliers = diagnostics.detect_outliers(&store, 0.3, 2);
    let ids: Vec<&str> = outliers.iter().map(|o| o.pair_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
    assert!(approx_eq(outliers[0].divergence, 0.8));
    assert_eq!(outliers[1].is_match, Some(true));
}

#[test]
fn test_detect_outliers_inclusive_threshold() {
    let diagnostics = diagnostics_with(SemanticEmbedder::fallback_only());
    let store = store(vec![record("a", 0.75, Some(0.25), Some(true))]);
    assert_eq!(diagnostics.detect_outliers(&store, 0.5, 1).len(), 1);
}

#[test]
fn test_detect_outliers_requires_min_samples() {
    let diagnostics = diagnostics_with(SemanticEmbedder::fallback_only());
    let store = store(vec![record("a", 0.9, Some(0.1), Some(true))]);
    assert!(diagnostics.detect_outliers(&store, 0.3, 5).is_empty());
}

#[test]
fn test_missing_similarity_comes_from_embedder() {
    // Every text maps to the same mock vector, so similarity is 1.0.
    let diagnostics = diagnostics_with(SemanticEmbedder::new(Arc::new(MockEmbeddingBackend::new())));
    let store = store(vec![record("a", 0.2, None, Some(false))]);

    let outliers = diagnostics.detect_outliers(&store, 0.5, 1);
    assert_eq!(outliers.len(), 1);
    assert!(approx_eq(outliers[0].semantic_score, 1.0));
    assert!(approx_eq(outliers[0].divergence, 0.8));
}

#[test]
fn test_validate_consistency_custom_cases() {
    let diagnostics = diagnostics_with(SemanticEmbedder::fallback_only());
    let cases = vec![
        ConsistencyCase::new("велосипед горный", "велосипед горный", "спорт", "спорт", true),
        ConsistencyCase::new("велосипед", "диван угловой", "спорт", "мебель", false),
    ];

    let report = diagnostics.validate_consistency(Some(&cases));
    assert_eq!(report.total, 2);
    assert_eq!(report.results.len(), 2);
    assert!(report.results[0].rule_match);
    assert!(report.results[0].semantic_match);
    assert!(report.results[0].hybrid_match);
    assert!(!report.results[1].rule_match);
    assert!(!report.results[1].hybrid_match);
    assert_eq!(report.rule_accuracy, 1.0);
    assert_eq!(report.hybrid_accuracy, 1.0);
}

#[test]
fn test_validate_consistency_default_cases() {
    let diagnostics = diagnostics_with(SemanticEmbedder::fallback_only());
    let report = diagnostics.validate_consistency(None);

    assert_eq!(report.total, default_cases().len());
    for value in [
        report.rule_accuracy,
        report.semantic_accuracy,
        report.hybrid_accuracy,
        report.rule_semantic_agreement,
    ] {
        assert!((0.0..=1.0).contains(&value));
    }
}

#[test]
fn test_training_candidates_are_unlabeled_and_limited() {
    let diagnostics = diagnostics_with(SemanticEmbedder::fallback_only());
    let store = store(vec![
        record("labeled", 1.0, Some(0.0), Some(true)),
        record("u1", 0.9, Some(0.2), None),
        record("u2", 0.1, Some(0.9), None),
        record("u3", 0.5, Some(0.5), None),
    ]);

    let candidates = diagnostics.training_candidates(&store, 0.3, 1);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].pair_id, "u2");

    let all = diagnostics.training_candidates(&store, 0.3, 10);
    let ids: Vec<&str> = all.iter().map(|c| c.pair_id.as_str()).collect();
    assert_eq!(ids, vec!["u2", "u1"]);
}

#[test]
fn test_export_training_candidates_writes_jsonl() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("out").join("candidates.jsonl");
    let diagnostics = diagnostics_with(SemanticEmbedder::fallback_only());
    let store = store(vec![
        record("u1", 0.9, Some(0.2), None),
        record("u2", 0.1, Some(0.9), None),
    ]);

    let written = diagnostics
        .export_training_candidates(&store, &path, 0.3, 10)
        .expect("export");
    assert_eq!(written, 2);

    let contents = fs::read_to_string(&path).expect("read");
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|l| serde_json::from_str(l).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["pair_id"], "u2");
}

#[test]
fn test_comprehensive_report() {
    let dir = TempDir::new().expect("tempdir");
    let diagnostics = diagnostics_with(SemanticEmbedder::fallback_only());
    let store = store(vec![
        record("a", 0.9, Some(0.1), Some(true)),
        record("b", 0.4, Some(0.4), Some(false)),
        record("c", 0.6, Some(0.5), None),
    ]);
    let config = DiagnosticsConfig::default().with_min_samples(2);

    let report = diagnostics.comprehensive_report(&store, &config);
    assert_eq!(report.statistics.total, 3);
    assert_eq!(report.statistics.labeled, 2);
    assert_eq!(report.outliers.len(), 1);
    assert_eq!(report.distribution.count, 3);
    assert!(report.consistency.total > 0);

    let path = dir.path().join("report.json");
    Diagnostics::save_report(&report, &path).expect("save");
    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(saved["statistics"]["total"], 3);
}
