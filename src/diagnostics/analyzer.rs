use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::features::{MatchingRecord, MatchingStore, StoreStatistics};
use crate::scoring::HybridMatcher;

use super::consistency::{CaseResult, ConsistencyCase, ConsistencyReport, default_cases};
use super::divergence::{DivergenceDistribution, Outlier, sort_by_divergence};
use super::error::{DiagnosticsError, DiagnosticsResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagnosticsConfig {
    /// Minimum `|rule - semantic|` for a labeled pair to count as an outlier.
    pub divergence_threshold: f64,
    /// Labeled records required before outliers are reported.
    pub min_samples: usize,
    /// Minimum divergence for labeling candidates.
    pub min_candidate_divergence: f64,
    pub candidate_limit: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            divergence_threshold: 0.3,
            min_samples: 10,
            min_candidate_divergence: 0.3,
            candidate_limit: 100,
        }
    }
}

impl DiagnosticsConfig {
    pub fn with_divergence_threshold(mut self, threshold: f64) -> Self {
        self.divergence_threshold = threshold;
        self
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn with_candidates(mut self, min_divergence: f64, limit: usize) -> Self {
        self.min_candidate_divergence = min_divergence;
        self.candidate_limit = limit;
        self
    }
}

/// Everything [`Diagnostics::comprehensive_report`] gathers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticReport {
    pub generated_at: DateTime<Utc>,
    pub statistics: StoreStatistics,
    pub divergence_threshold: f64,
    pub outliers: Vec<Outlier>,
    pub consistency: ConsistencyReport,
    pub distribution: DivergenceDistribution,
}

/// Offline checks comparing the rule-based and semantic views of stored pairs.
///
/// The rule view of a record is its stored `equivalence_score`. The semantic
/// view is its stored similarity, or a fresh one from the matcher's embedder.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    matcher: Arc<HybridMatcher>,
}

impl Diagnostics {
    pub fn new(matcher: Arc<HybridMatcher>) -> Self {
        Self { matcher }
    }

    pub fn matcher(&self) -> &HybridMatcher {
        &self.matcher
    }

    /// Labeled pairs with divergence at or above `divergence_threshold`,
    /// largest first. Empty when fewer than `min_samples` pairs are labeled.
    pub fn detect_outliers(
        &self,
        store: &MatchingStore,
        divergence_threshold: f64,
        min_samples: usize,
    ) -> Vec<Outlier> {
        let labeled: Vec<&MatchingRecord> = store.labeled_records().collect();
        if labeled.len() < min_samples {
            warn!(
                labeled = labeled.len(),
                min_samples, "Not enough labeled pairs for outlier detection"
            );
            return Vec::new();
        }

        let mut outliers: Vec<Outlier> = self
            .score_records(&labeled)
            .into_iter()
            .filter(|o| o.divergence >= divergence_threshold)
            .collect();
        sort_by_divergence(&mut outliers);

        info!(
            labeled = labeled.len(),
            outliers = outliers.len(),
            divergence_threshold,
            "Outlier detection finished"
        );
        outliers
    }

    /// Runs `cases`, or the built-in set, through the rule, semantic and
    /// hybrid scorers at the matcher's decision threshold.
    pub fn validate_consistency(&self, cases: Option<&[ConsistencyCase]>) -> ConsistencyReport {
        let defaults;
        let cases = match cases {
            Some(cases) => cases,
            None => {
                defaults = default_cases();
                defaults.as_slice()
            }
        };

        let threshold = self.matcher.decision_threshold();
        let results: Vec<CaseResult> = cases
            .iter()
            .map(|case| {
                let outcome = self.matcher.evaluate(
                    &case.text1,
                    &case.text2,
                    &case.category1,
                    &case.category2,
                    None,
                );
                let rule_score = outcome.components.rule.total;
                let semantic_score = outcome
                    .components
                    .semantic_score
                    .unwrap_or_else(|| self.matcher.embedder().similarity(&case.text1, &case.text2));

                CaseResult {
                    case: case.clone(),
                    rule_score,
                    semantic_score,
                    hybrid_score: outcome.total_score,
                    rule_match: rule_score >= threshold,
                    semantic_match: semantic_score >= threshold,
                    hybrid_match: outcome.is_match,
                }
            })
            .collect();

        let report = ConsistencyReport::from_results(results);
        info!(
            cases = report.total,
            rule_accuracy = report.rule_accuracy,
            semantic_accuracy = report.semantic_accuracy,
            hybrid_accuracy = report.hybrid_accuracy,
            agreement = report.rule_semantic_agreement,
            "Consistency validated"
        );
        report
    }

    /// Divergence summary over every record in `store`.
    pub fn divergence_distribution(&self, store: &MatchingStore) -> DivergenceDistribution {
        let records: Vec<&MatchingRecord> = store.records().iter().collect();
        let values: Vec<f64> = self
            .score_records(&records)
            .iter()
            .map(|o| o.divergence)
            .collect();
        DivergenceDistribution::from_values(&values)
    }

    pub fn comprehensive_report(
        &self,
        store: &MatchingStore,
        config: &DiagnosticsConfig,
    ) -> DiagnosticReport {
        let report = DiagnosticReport {
            generated_at: Utc::now(),
            statistics: store.statistics(),
            divergence_threshold: config.divergence_threshold,
            outliers: self.detect_outliers(store, config.divergence_threshold, config.min_samples),
            consistency: self.validate_consistency(None),
            distribution: self.divergence_distribution(store),
        };

        info!(
            records = report.statistics.total,
            outliers = report.outliers.len(),
            mean_divergence = report.distribution.mean,
            "Diagnostic report generated"
        );
        report
    }

    /// Unlabeled pairs with divergence at or above `min_divergence`, largest
    /// first, at most `limit`.
    pub fn training_candidates(
        &self,
        store: &MatchingStore,
        min_divergence: f64,
        limit: usize,
    ) -> Vec<Outlier> {
        let unlabeled: Vec<&MatchingRecord> = store.unlabeled_records().collect();
        let mut candidates: Vec<Outlier> = self
            .score_records(&unlabeled)
            .into_iter()
            .filter(|o| o.divergence >= min_divergence)
            .collect();
        sort_by_divergence(&mut candidates);
        candidates.truncate(limit);
        candidates
    }

    /// Writes [`training_candidates`](Self::training_candidates) as JSONL and
    /// returns how many were written.
    pub fn export_training_candidates(
        &self,
        store: &MatchingStore,
        path: &Path,
        min_divergence: f64,
        limit: usize,
    ) -> DiagnosticsResult<usize> {
        let candidates = self.training_candidates(store, min_divergence, limit);

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| DiagnosticsError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| DiagnosticsError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        for candidate in &candidates {
            serde_json::to_writer(&mut writer, candidate)?;
            writer
                .write_all(b"\n")
                .map_err(|e| DiagnosticsError::io(path, e))?;
        }
        writer.flush().map_err(|e| DiagnosticsError::io(path, e))?;

        info!(
            path = %path.display(),
            candidates = candidates.len(),
            min_divergence,
            "Training candidates exported"
        );
        Ok(candidates.len())
    }

    /// Writes `report` as pretty JSON.
    pub fn save_report(report: &DiagnosticReport, path: &Path) -> DiagnosticsResult<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| DiagnosticsError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(report)?;
        fs::write(path, json).map_err(|e| DiagnosticsError::io(path, e))?;
        Ok(())
    }

    /// Rule and semantic scores for `records`; missing similarities are
    /// computed in one batch.
    fn score_records(&self, records: &[&MatchingRecord]) -> Vec<Outlier> {
        let missing: Vec<(&str, &str)> = records
            .iter()
            .filter(|r| r.semantic_similarity.is_none())
            .map(|r| (r.text1.as_str(), r.text2.as_str()))
            .collect();
        let mut computed = self.matcher.embedder().batch_similarity(&missing).into_iter();

        records
            .iter()
            .map(|record| {
                let semantic = match record.semantic_similarity {
                    Some(similarity) => similarity,
                    None => computed.next().unwrap_or(0.0),
                };
                Outlier::new(record, record.features.equivalence_score, semantic)
            })
            .collect()
    }
}
