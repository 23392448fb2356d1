use std::collections::{BTreeMap, HashMap};

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_DECISION_THRESHOLD, RETRAIN_WINDOW_DAYS};
use crate::features::MatchingStore;
use crate::training::{ConfusionMatrix, ModelTrainer};

use super::entry::{FeedbackAction, FeedbackEntry};
use super::error::FeedbackResult;
use super::log::FeedbackLog;

/// Counts over a trailing window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeedbackStats {
    pub window_days: i64,
    pub total: usize,
    pub confirmed: usize,
    pub rejected: usize,
    pub ignored: usize,
    /// `confirmed / (confirmed + rejected)`, 0.0 with neither.
    pub accuracy: f64,
}

/// Online quality of the scores users were shown.
///
/// Ground truth is the entry's `is_match`; the prediction is
/// `prediction_score >= 0.5`. Ignored entries are not counted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RuntimeMetrics {
    pub evaluated: usize,
    pub confusion: ConfusionMatrix,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub accuracy: f64,
}

/// Outcome of [`FeedbackManager::commit_to_training`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitReport {
    /// Labeling entries read from the log.
    pub replayed: usize,
    /// Distinct pairs after folding to the latest entry per pair.
    pub pairs: usize,
    /// Store records whose label changed.
    pub applied: usize,
    /// Entries whose pair is not in the store.
    pub unknown_pairs: usize,
    /// Version of the newly trained model, if retraining ran.
    pub retrained_version: Option<String>,
    pub metrics: BTreeMap<String, f64>,
}

/// Records user feedback, tracks online metrics and decides when to retrain.
#[derive(Debug)]
pub struct FeedbackManager {
    log: FeedbackLog,
    min_new_feedback: usize,
}

impl FeedbackManager {
    pub fn new(log: FeedbackLog, min_new_feedback: usize) -> Self {
        Self {
            log,
            min_new_feedback,
        }
    }

    pub fn log(&self) -> &FeedbackLog {
        &self.log
    }

    pub fn min_new_feedback(&self) -> usize {
        self.min_new_feedback
    }

    /// Appends an entry and writes its label into `store`. Ignored entries are
    /// logged without touching the store.
    #[allow(clippy::too_many_arguments)]
    pub fn log_feedback(
        &mut self,
        store: &mut MatchingStore,
        pair_id: &str,
        user_id: &str,
        is_match: bool,
        prediction_score: f64,
        action: FeedbackAction,
        metadata: BTreeMap<String, serde_json::Value>,
    ) -> FeedbackResult<FeedbackEntry> {
        let entry = FeedbackEntry::new(pair_id, user_id, is_match, prediction_score, action)
            .with_metadata(metadata);
        self.record(store, entry.clone())?;
        Ok(entry)
    }

    /// [`log_feedback`](Self::log_feedback) for a prebuilt entry.
    pub fn record(&mut self, store: &mut MatchingStore, entry: FeedbackEntry) -> FeedbackResult<()> {
        self.log.append(entry.clone())?;

        if entry.is_labeling() {
            let known = store.add_feedback_with(
                &entry.pair_id,
                entry.is_match,
                Some(entry.user_action.to_string()),
                None,
            )?;
            if !known {
                warn!(pair_id = %entry.pair_id, "Feedback for a pair missing from the store");
            }
        }

        info!(
            pair_id = %entry.pair_id,
            user_id = %entry.user_id,
            action = %entry.user_action,
            is_match = entry.is_match,
            prediction_score = entry.prediction_score,
            "Feedback logged"
        );
        Ok(())
    }

    pub fn feedback_stats(&self, days: i64) -> FeedbackStats {
        let cutoff = Utc::now() - Duration::days(days);
        let mut stats = FeedbackStats {
            window_days: days,
            total: 0,
            confirmed: 0,
            rejected: 0,
            ignored: 0,
            accuracy: 0.0,
        };

        for entry in self.log.entries().iter().filter(|e| e.timestamp >= cutoff) {
            stats.total += 1;
            match entry.user_action {
                FeedbackAction::Confirmed => stats.confirmed += 1,
                FeedbackAction::Rejected => stats.rejected += 1,
                FeedbackAction::Ignored => stats.ignored += 1,
            }
        }

        let decided = stats.confirmed + stats.rejected;
        if decided > 0 {
            stats.accuracy = stats.confirmed as f64 / decided as f64;
        }
        stats
    }

    pub fn runtime_metrics(&self) -> RuntimeMetrics {
        let mut confusion = ConfusionMatrix::default();
        for entry in self.log.entries().iter().filter(|e| e.is_labeling()) {
            confusion.record(
                entry.is_match,
                entry.prediction_score >= DEFAULT_DECISION_THRESHOLD,
            );
        }

        RuntimeMetrics {
            evaluated: confusion.total(),
            precision: confusion.precision(),
            recall: confusion.recall(),
            f1: confusion.f1(),
            accuracy: confusion.accuracy(),
            confusion,
        }
    }

    /// True when the last week's feedback or the store's unlabeled backlog
    /// exceeds `min_new_feedback`.
    pub fn should_retrain(&self, store: &MatchingStore, min_new_feedback: usize) -> bool {
        let recent = self.feedback_stats(RETRAIN_WINDOW_DAYS).total;
        let backlog = store.unlabeled_count();
        let retrain = recent > min_new_feedback || backlog > min_new_feedback;

        debug!(recent, backlog, min_new_feedback, retrain, "Retrain check");
        retrain
    }

    /// Replays the feedback log into `store`, then retrains through `trainer`
    /// when `auto_retrain` is set and the retrain trigger fires.
    pub fn commit_to_training(
        &self,
        store: &mut MatchingStore,
        auto_retrain: bool,
        trainer: &ModelTrainer,
    ) -> FeedbackResult<CommitReport> {
        let mut report = CommitReport {
            replayed: 0,
            pairs: 0,
            applied: 0,
            unknown_pairs: 0,
            retrained_version: None,
            metrics: BTreeMap::new(),
        };

        // Only the latest labeling entry per pair counts.
        let mut latest: HashMap<&str, &FeedbackEntry> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for entry in self.log.entries().iter().filter(|e| e.is_labeling()) {
            report.replayed += 1;
            if latest.insert(entry.pair_id.as_str(), entry).is_none() {
                order.push(entry.pair_id.as_str());
            }
        }

        report.pairs = order.len();
        for entry in order.iter().filter_map(|id| latest.get(id).copied()) {
            let action = entry.user_action.to_string();
            let Some(current) = store.get(&entry.pair_id) else {
                report.unknown_pairs += 1;
                continue;
            };
            if current.is_match == Some(entry.is_match)
                && current.user_feedback.as_deref() == Some(action.as_str())
            {
                continue;
            }
            store.add_feedback_with(&entry.pair_id, entry.is_match, Some(action), None)?;
            report.applied += 1;
        }

        info!(
            replayed = report.replayed,
            pairs = report.pairs,
            applied = report.applied,
            unknown_pairs = report.unknown_pairs,
            "Feedback committed to store"
        );

        if auto_retrain && self.should_retrain(store, self.min_new_feedback) {
            let outcome = trainer.run(store)?;
            info!(version = %outcome.artifact.version, f1 = outcome.report.f1, "Retrained model");
            report.retrained_version = Some(outcome.artifact.version.clone());
            report.metrics = outcome.artifact.metrics;
        }

        Ok(report)
    }
}
