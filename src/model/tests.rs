use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;

use super::*;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn separable_data() -> (Vec<Vec<f64>>, Vec<u8>) {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for i in 0..20 {
        let jitter = i as f64 * 0.01;
        rows.push(vec![0.8 + jitter, 0.9, 0.1]);
        labels.push(1);
        rows.push(vec![0.1 + jitter, 0.1, 0.1]);
        labels.push(0);
    }
    (rows, labels)
}

fn trained_artifact(kind: ClassifierKind, version: &str) -> ModelArtifact {
    let (rows, labels) = separable_data();
    let scaler = StandardScaler::fit(&rows).expect("scaler");
    let classifier =
        Classifier::fit(kind, &scaler.transform_all(&rows), &labels, &FitParams::default())
            .expect("fit");

    let mut metrics = BTreeMap::new();
    metrics.insert("f1".to_string(), 1.0);

    ModelArtifact {
        version: version.to_string(),
        classifier,
        scaler,
        feature_names: vec![
            "equivalence_score".to_string(),
            "category_match".to_string(),
            "length_diff".to_string(),
        ],
        threshold: 0.5,
        saved_at: Utc::now(),
        metrics,
    }
}

fn features(equivalence: f64, category: f64, overlap: f64) -> HashMap<String, f64> {
    HashMap::from([
        ("equivalence_score".to_string(), equivalence),
        ("category_match".to_string(), category),
        ("word_overlap".to_string(), overlap),
    ])
}

#[test]
fn test_scaler_fit_transform() {
    let scaler = StandardScaler::fit(&[vec![1.0, 5.0], vec![3.0, 5.0]]).expect("fit");
    assert_eq!(scaler.mean, vec![2.0, 5.0]);
    // Constant column keeps a unit scale.
    assert_eq!(scaler.scale, vec![1.0, 1.0]);
    assert_eq!(scaler.transform(&[3.0, 5.0]), vec![1.0, 0.0]);
    assert_eq!(scaler.transform(&[3.0]), vec![1.0, -5.0]);

    assert!(StandardScaler::fit(&[]).is_err());
    assert!(StandardScaler::fit(&[vec![1.0], vec![1.0, 2.0]]).is_err());
}

#[test]
fn test_logistic_regression_separates_classes() {
    let artifact = trained_artifact(ClassifierKind::LogisticRegression, "v1");
    assert!(artifact.classifier.supports_probability());

    let pos = artifact.scaler.transform(&[0.9, 0.9, 0.1]);
    let neg = artifact.scaler.transform(&[0.1, 0.1, 0.2]);
    let p_pos = artifact.classifier.predict_proba(&pos).expect("proba");
    let p_neg = artifact.classifier.predict_proba(&neg).expect("proba");

    assert!(p_pos > 0.5, "positive prob {p_pos}");
    assert!(p_neg < 0.5, "negative prob {p_neg}");
    assert!(artifact.classifier.predict(&pos, 0.5));
    assert!(!artifact.classifier.predict(&neg, 0.5));
}

#[test]
fn test_linear_svm_has_no_probability() {
    let artifact = trained_artifact(ClassifierKind::LinearSvm, "v1");
    let pos = artifact.scaler.transform(&[0.9, 0.9, 0.1]);
    let neg = artifact.scaler.transform(&[0.1, 0.1, 0.2]);

    assert!(!artifact.classifier.supports_probability());
    assert!(artifact.classifier.predict_proba(&pos).is_none());
    assert!(artifact.classifier.decision_function(&pos) > 0.0);
    assert!(artifact.classifier.decision_function(&neg) < 0.0);
}

#[test]
fn test_fit_rejects_single_class() {
    let rows = vec![vec![1.0], vec![2.0]];
    let result = Classifier::fit(
        ClassifierKind::LogisticRegression,
        &rows,
        &[1, 1],
        &FitParams::default(),
    );
    assert!(matches!(result, Err(ModelError::InvalidInput { .. })));
}

#[test]
fn test_classifier_kind_parse() {
    assert_eq!(
        "logistic".parse::<ClassifierKind>(),
        Ok(ClassifierKind::LogisticRegression)
    );
    assert_eq!("SVM".parse::<ClassifierKind>(), Ok(ClassifierKind::LinearSvm));
    assert!("gbdt".parse::<ClassifierKind>().is_err());
}

#[test]
fn test_vectorize_zero_fills_and_ignores_unknown() {
    let artifact = trained_artifact(ClassifierKind::LogisticRegression, "v1");
    let mut map = features(0.7, 1.0, 0.4);
    map.insert("unrelated".to_string(), 9.0);

    assert_eq!(artifact.vectorize(&map), vec![0.7, 1.0, 0.0]);
}

#[test]
fn test_save_then_load_reproduces_predictions() {
    let dir = TempDir::new().expect("tempdir");
    let store = ArtifactStore::new(dir.path());
    let artifact = trained_artifact(ClassifierKind::LogisticRegression, "v20250101_000000");

    let path = store.save(&artifact).expect("save");
    for file in [CLASSIFIER_FILE, SCALER_FILE, METADATA_FILE, FEATURE_COLUMNS_FILE] {
        assert!(path.join(file).exists(), "missing {file}");
    }
    assert_eq!(store.latest_version().expect("latest"), "v20250101_000000");

    let loaded = store.load_latest().expect("load");
    assert_eq!(loaded.feature_names, artifact.feature_names);

    let input = features(0.65, 0.5, 0.3);
    let before = ModelPredictor::with_artifact(artifact);
    let after = ModelPredictor::with_artifact(loaded);
    assert_eq!(before.predict(&input, true), after.predict(&input, true));
    assert_eq!(before.predict(&input, false), after.predict(&input, false));
}

#[test]
fn test_metadata_file_contents() {
    let dir = TempDir::new().expect("tempdir");
    let store = ArtifactStore::new(dir.path());
    let path = store
        .save(&trained_artifact(ClassifierKind::LinearSvm, "v1"))
        .expect("save");

    let raw = fs::read_to_string(path.join(METADATA_FILE)).expect("read");
    let metadata: ModelMetadata = serde_json::from_str(&raw).expect("parse");
    assert_eq!(metadata.model_type, "linear_svm");
    assert_eq!(metadata.feature_count, 3);
    assert_eq!(metadata.metrics.get("f1"), Some(&1.0));
}

#[test]
fn test_partial_bundle_is_unavailable() {
    let dir = TempDir::new().expect("tempdir");
    let store = ArtifactStore::new(dir.path());
    let path = store
        .save(&trained_artifact(ClassifierKind::LogisticRegression, "v1"))
        .expect("save");
    fs::remove_file(path.join(SCALER_FILE)).expect("remove");

    assert!(matches!(
        store.load_latest(),
        Err(ModelError::MissingComponent { component: SCALER_FILE, .. })
    ));

    let predictor = ModelPredictor::new(PredictorConfig::new(dir.path()));
    assert!(!predictor.is_model_loaded());
    let input = features(0.8, 1.0, 0.5);
    assert!(approx_eq(predictor.predict(&input, true), fallback_score(&input)));
}

#[test]
fn test_inconsistent_bundle_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let store = ArtifactStore::new(dir.path());
    let path = store
        .save(&trained_artifact(ClassifierKind::LogisticRegression, "v1"))
        .expect("save");
    fs::write(path.join(FEATURE_COLUMNS_FILE), r#"["a", "b"]"#).expect("write");

    assert!(matches!(
        store.load("v1"),
        Err(ModelError::Inconsistent { .. })
    ));
}

#[test]
fn test_list_versions_sorted() {
    let dir = TempDir::new().expect("tempdir");
    let store = ArtifactStore::new(dir.path());
    assert!(store.list_versions().expect("list").is_empty());

    store
        .save(&trained_artifact(ClassifierKind::LogisticRegression, "v20250102_000000"))
        .expect("save");
    store
        .save(&trained_artifact(ClassifierKind::LogisticRegression, "v20250101_000000"))
        .expect("save");

    assert_eq!(
        store.list_versions().expect("list"),
        vec!["v20250101_000000", "v20250102_000000"]
    );
    // LATEST follows the last save, not the sort order.
    assert_eq!(store.latest_version().expect("latest"), "v20250101_000000");
}

#[test]
fn test_missing_store_has_no_active_version() {
    let dir = TempDir::new().expect("tempdir");
    let store = ArtifactStore::new(dir.path().join("models"));
    assert!(matches!(
        store.load_latest(),
        Err(ModelError::NoActiveVersion { .. })
    ));
}

#[test]
fn test_fallback_score_formula() {
    let input = features(0.8, 1.0, 0.5);
    assert!(approx_eq(fallback_score(&input), 0.5 * 0.8 + 0.3 * 1.0 + 0.2 * 0.5));
    assert_eq!(fallback_score(&HashMap::new()), 0.0);
}

#[test]
fn test_unavailable_predictor_uses_heuristic() {
    let predictor = ModelPredictor::unavailable();
    assert!(!predictor.is_model_loaded());
    assert_eq!(predictor.threshold(), 0.5);

    let high = features(0.8, 1.0, 0.5);
    let low = features(0.1, 0.1, 0.0);
    assert!(approx_eq(predictor.predict(&high, true), 0.8));
    assert_eq!(predictor.predict(&high, false), 1.0);
    assert_eq!(predictor.predict(&low, false), 0.0);

    let batch = predictor.predict_batch(&[high.clone(), low.clone()], true);
    assert!(approx_eq(batch[0], fallback_score(&high)));
    assert!(approx_eq(batch[1], fallback_score(&low)));
}

#[test]
fn test_svm_probability_request_falls_back() {
    let predictor =
        ModelPredictor::with_artifact(trained_artifact(ClassifierKind::LinearSvm, "v1"));
    let input = features(0.9, 0.9, 0.3);

    assert!(approx_eq(predictor.predict(&input, true), fallback_score(&input)));
    // Decisions still come from the classifier.
    assert_eq!(predictor.predict(&input, false), 1.0);
    assert_eq!(predictor.predict(&features(0.1, 0.1, 0.0), false), 0.0);
}

#[test]
fn test_reload_picks_up_new_version() {
    let dir = TempDir::new().expect("tempdir");
    let store = ArtifactStore::new(dir.path());
    store
        .save(&trained_artifact(ClassifierKind::LogisticRegression, "v1"))
        .expect("save");

    let predictor = ModelPredictor::new(PredictorConfig::new(dir.path()));
    assert_eq!(predictor.artifact().expect("loaded").version, "v1");

    store
        .save(&trained_artifact(ClassifierKind::LinearSvm, "v2"))
        .expect("save");
    // No hot swap without reload.
    assert_eq!(predictor.artifact().expect("loaded").version, "v1");

    assert_eq!(predictor.reload().expect("reload"), "v2");
    assert_eq!(predictor.artifact().expect("loaded").version, "v2");
}

#[test]
fn test_reload_failure_keeps_current_artifact() {
    let predictor =
        ModelPredictor::with_artifact(trained_artifact(ClassifierKind::LogisticRegression, "v1"));
    assert!(matches!(predictor.reload(), Err(ModelError::NotConfigured)));
    assert!(predictor.is_model_loaded());
}

#[test]
fn test_concurrent_first_use_loads_once() {
    let dir = TempDir::new().expect("tempdir");
    ArtifactStore::new(dir.path())
        .save(&trained_artifact(ClassifierKind::LogisticRegression, "v1"))
        .expect("save");

    let predictor = Arc::new(ModelPredictor::new(PredictorConfig::new(dir.path())));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let predictor = Arc::clone(&predictor);
            std::thread::spawn(move || predictor.artifact().expect("loaded"))
        })
        .collect();

    let artifacts: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("join"))
        .collect();
    for artifact in &artifacts[1..] {
        assert!(Arc::ptr_eq(&artifacts[0], artifact));
    }
}
