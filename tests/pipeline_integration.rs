//! End-to-end: score, record, collect feedback, train, reload, score again.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;

use common::fixtures::{add_labeled_records, mock_matcher};
use tempfile::TempDir;

use barter_match::config::EngineConfig;
use barter_match::features::MatchingStore;
use barter_match::feedback::{FeedbackAction, FeedbackLog, FeedbackManager};
use barter_match::model::{ArtifactStore, ModelPredictor};
use barter_match::scoring::MatchRequest;
use barter_match::training::{ModelTrainer, TrainerConfig};

#[test]
fn test_score_record_and_label_survive_reopen() {
    let dir = TempDir::new().expect("tempdir");
    let config = EngineConfig::with_data_dir(dir.path());
    let matcher = mock_matcher(Arc::new(ModelPredictor::new(config.predictor_config())));

    let request = MatchRequest::new("велосипед горный", "горный велосипед", "спорт", "спорт");
    let pair_id = {
        let mut store = MatchingStore::open(&config.records_path).expect("open store");
        let outcome = matcher.record_pair(&mut store, &request).expect("record");
        assert!(outcome.is_valid);
        assert!(!matcher.predictor().is_model_loaded());

        let mut manager = FeedbackManager::new(
            FeedbackLog::open(&config.feedback_path).expect("open log"),
            config.min_new_feedback,
        );
        manager
            .log_feedback(
                &mut store,
                &outcome.pair_id,
                "user-1",
                true,
                outcome.total_score,
                FeedbackAction::Confirmed,
                BTreeMap::new(),
            )
            .expect("feedback");
        outcome.pair_id
    };

    let store = MatchingStore::open(&config.records_path).expect("reopen store");
    assert_eq!(store.len(), 1);
    let record = store.get(&pair_id).expect("record");
    assert_eq!(record.is_match, Some(true));
    assert_eq!(record.user_feedback.as_deref(), Some("confirmed"));
    assert_eq!(record.semantic_similarity, Some(1.0));

    let log = FeedbackLog::open(&config.feedback_path).expect("reopen log");
    assert_eq!(log.len(), 1);
    assert_eq!(log.entries()[0].pair_id, pair_id);
}

#[test]
fn test_train_then_reload_switches_predictor_to_model() {
    let dir = TempDir::new().expect("tempdir");
    let mut config = EngineConfig::with_data_dir(dir.path());
    config.min_training_samples = 20;

    let mut store = MatchingStore::open(&config.records_path).expect("open store");
    add_labeled_records(&mut store, "seed", 40);

    let predictor = Arc::new(ModelPredictor::new(config.predictor_config()));
    let matcher = mock_matcher(Arc::clone(&predictor));

    let before = matcher.evaluate("велосипед", "велосипед", "спорт", "спорт", None);
    assert!(!predictor.is_model_loaded());

    let trainer = ModelTrainer::new(
        TrainerConfig::default()
            .with_min_samples(config.min_training_samples)
            .with_semantic(true),
        ArtifactStore::new(&config.model_dir),
    );
    let outcome = trainer.run(&store).expect("train");
    assert_eq!(outcome.report.f1, 1.0);

    let version = predictor.reload().expect("reload");
    assert_eq!(version, outcome.artifact.version);
    assert!(predictor.is_model_loaded());

    let after = matcher.evaluate("велосипед", "велосипед", "спорт", "спорт", None);
    assert!((0.0..=1.0).contains(&after.components.ml_score));
    assert_eq!(after.pair_id, before.pair_id);
    assert!(after.is_match);
}

#[test]
fn test_commit_replays_log_into_rebuilt_store() {
    let dir = TempDir::new().expect("tempdir");
    let config = EngineConfig::with_data_dir(dir.path());
    let matcher = mock_matcher(Arc::new(ModelPredictor::unavailable()));

    let requests = [
        MatchRequest::new("диван угловой", "угловой диван", "мебель", "мебель"),
        MatchRequest::new("ноутбук", "зимняя куртка", "электроника", "одежда"),
    ];

    let mut manager = FeedbackManager::new(
        FeedbackLog::open(&config.feedback_path).expect("open log"),
        1000,
    );
    let mut original = MatchingStore::in_memory();
    let mut rebuilt = MatchingStore::open(&config.records_path).expect("open store");

    for (request, is_match) in requests.iter().zip([true, false]) {
        let outcome = matcher.record_pair(&mut original, request).expect("record");
        matcher.record_pair(&mut rebuilt, request).expect("record");
        let action = if is_match {
            FeedbackAction::Confirmed
        } else {
            FeedbackAction::Rejected
        };
        manager
            .log_feedback(
                &mut original,
                &outcome.pair_id,
                "user-2",
                is_match,
                outcome.total_score,
                action,
                BTreeMap::new(),
            )
            .expect("feedback");
    }
    assert_eq!(rebuilt.statistics().labeled, 0);

    let trainer = ModelTrainer::new(TrainerConfig::default(), ArtifactStore::new(&config.model_dir));
    let report = manager
        .commit_to_training(&mut rebuilt, true, &trainer)
        .expect("commit");

    assert_eq!(report.applied, 2);
    assert_eq!(report.retrained_version, None);
    let stats = rebuilt.statistics();
    assert_eq!(stats.positive, 1);
    assert_eq!(stats.negative, 1);
}
