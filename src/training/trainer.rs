use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{info, warn};

use crate::constants::{
    BASE_FEATURE_NAMES, DEFAULT_DECISION_THRESHOLD, MAX_POSITIVE_RATIO, MIN_POSITIVE_RATIO,
    SPLIT_SEED, TEST_FRACTION,
};
use crate::features::{MatchingRecord, MatchingStore, category_pair_feature, semantic_features};
use crate::model::{
    ArtifactStore, Classifier, ClassifierKind, FitParams, ModelArtifact, StandardScaler,
};

use super::error::{TrainingError, TrainingResult};
use super::metrics::{ConfusionMatrix, EvaluationReport, roc_auc};
use super::split::stratified_split;
use super::tuner::{ThresholdTuner, TunerConfig};

#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    pub classifier: ClassifierKind,
    pub fit: FitParams,
    pub min_samples: usize,
    pub test_fraction: f64,
    pub seed: u64,
    /// Append one-hot category-pair features.
    pub include_categories: bool,
    /// Append similarity, confidence and centered similarity.
    pub include_semantic: bool,
    /// Tune the decision threshold on the held-out split. Without it, or for
    /// classifiers without probabilities, `default_threshold` is stored.
    pub tune_threshold: bool,
    pub tuner: TunerConfig,
    pub default_threshold: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::LogisticRegression,
            fit: FitParams::default(),
            min_samples: 50,
            test_fraction: TEST_FRACTION,
            seed: SPLIT_SEED,
            include_categories: false,
            include_semantic: false,
            tune_threshold: true,
            tuner: TunerConfig::default(),
            default_threshold: DEFAULT_DECISION_THRESHOLD,
        }
    }
}

impl TrainerConfig {
    pub fn with_classifier(mut self, classifier: ClassifierKind) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn with_categories(mut self, enabled: bool) -> Self {
        self.include_categories = enabled;
        self
    }

    pub fn with_semantic(mut self, enabled: bool) -> Self {
        self.include_semantic = enabled;
        self
    }

    pub fn with_threshold_tuning(mut self, enabled: bool) -> Self {
        self.tune_threshold = enabled;
        self
    }
}

/// Feature rows with their column names and labels, index-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub feature_names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

/// A trained artifact and its held-out evaluation.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub report: EvaluationReport,
}

/// Offline pipeline: labeled records in, versioned artifact out.
#[derive(Debug, Clone)]
pub struct ModelTrainer {
    config: TrainerConfig,
    artifacts: ArtifactStore,
}

impl ModelTrainer {
    pub fn new(config: TrainerConfig, artifacts: ArtifactStore) -> Self {
        Self { config, artifacts }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn artifacts(&self) -> &ArtifactStore {
        &self.artifacts
    }

    /// Labeled records from `store`, after the sample-count and balance checks.
    pub fn load_training_data(&self, store: &MatchingStore) -> TrainingResult<Vec<MatchingRecord>> {
        let records: Vec<MatchingRecord> = store.labeled_records().cloned().collect();

        if records.len() < self.config.min_samples {
            return Err(TrainingError::InsufficientSamples {
                required: self.config.min_samples,
                available: records.len(),
            });
        }

        let positives = records.iter().filter(|r| r.is_match == Some(true)).count();
        let ratio = if records.is_empty() {
            0.0
        } else {
            positives as f64 / records.len() as f64
        };
        if !(MIN_POSITIVE_RATIO..=MAX_POSITIVE_RATIO).contains(&ratio) {
            return Err(TrainingError::ImbalancedLabels {
                ratio,
                min: MIN_POSITIVE_RATIO,
                max: MAX_POSITIVE_RATIO,
            });
        }

        info!(
            samples = records.len(),
            positives,
            positive_ratio = ratio,
            "Training data loaded"
        );
        Ok(records)
    }

    /// Column names for `records`: the base features, then sorted category
    /// pairs over every observed `(category1, category2)` combination, then
    /// the semantic features.
    pub fn feature_names(&self, records: &[MatchingRecord]) -> Vec<String> {
        let mut names: Vec<String> = BASE_FEATURE_NAMES.iter().map(|n| n.to_string()).collect();

        if self.config.include_categories {
            let left: BTreeSet<&str> = records.iter().map(|r| r.category1.as_str()).collect();
            let right: BTreeSet<&str> = records.iter().map(|r| r.category2.as_str()).collect();
            for a in &left {
                for b in &right {
                    names.push(category_pair_feature(a, b));
                }
            }
        }

        if self.config.include_semantic {
            names.extend(semantic_features(0.0).iter().map(|(n, _)| n.to_string()));
        }

        names
    }

    pub fn prepare_features(&self, records: &[MatchingRecord]) -> FeatureMatrix {
        let feature_names = self.feature_names(records);
        let base_len = BASE_FEATURE_NAMES.len();

        let rows = records
            .iter()
            .map(|record| {
                let mut row = record.features.to_vec();
                row.resize(feature_names.len(), 0.0);

                if self.config.include_categories {
                    let pair = category_pair_feature(&record.category1, &record.category2);
                    if let Some(idx) = feature_names[base_len..].iter().position(|n| *n == pair) {
                        row[base_len + idx] = 1.0;
                    }
                }

                if self.config.include_semantic {
                    let similarity = record.semantic_similarity.unwrap_or(0.0);
                    let offset = feature_names.len() - 3;
                    for (i, (_, value)) in semantic_features(similarity).into_iter().enumerate() {
                        row[offset + i] = value;
                    }
                }
                row
            })
            .collect();

        let labels = records
            .iter()
            .map(|r| u8::from(r.is_match == Some(true)))
            .collect();

        FeatureMatrix {
            feature_names,
            rows,
            labels,
        }
    }

    /// Fits and evaluates a model on `records` tagged with `version`.
    pub fn train(&self, records: &[MatchingRecord], version: &str) -> TrainingResult<TrainingOutcome> {
        let matrix = self.prepare_features(records);
        let (train_idx, test_idx) =
            stratified_split(&matrix.labels, self.config.test_fraction, self.config.seed);
        if train_idx.is_empty() || test_idx.is_empty() {
            return Err(TrainingError::InvalidData {
                reason: format!(
                    "split produced {} train and {} test rows",
                    train_idx.len(),
                    test_idx.len()
                ),
            });
        }

        let select = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<u8>) {
            idx.iter()
                .map(|&i| (matrix.rows[i].clone(), matrix.labels[i]))
                .unzip()
        };
        let (train_rows, train_labels) = select(&train_idx);
        let (test_rows, test_labels) = select(&test_idx);

        let scaler = StandardScaler::fit(&train_rows)?;
        let classifier = Classifier::fit(
            self.config.classifier,
            &scaler.transform_all(&train_rows),
            &train_labels,
            &self.config.fit,
        )?;

        let scaled_test = scaler.transform_all(&test_rows);
        let probabilities: Option<Vec<f64>> = scaled_test
            .iter()
            .map(|x| classifier.predict_proba(x))
            .collect();

        let (threshold, confusion, auc) = match &probabilities {
            Some(proba) => {
                let threshold = if self.config.tune_threshold {
                    ThresholdTuner::new(self.config.tuner)
                        .tune(&test_labels, proba)
                        .threshold
                } else {
                    self.config.default_threshold
                };
                (
                    threshold,
                    ConfusionMatrix::at_threshold(&test_labels, proba, threshold),
                    roc_auc(&test_labels, proba),
                )
            }
            None => {
                let margins: Vec<f64> = scaled_test
                    .iter()
                    .map(|x| classifier.decision_function(x))
                    .collect();
                (
                    self.config.default_threshold,
                    ConfusionMatrix::at_threshold(&test_labels, &margins, 0.0),
                    roc_auc(&test_labels, &margins),
                )
            }
        };

        let report = EvaluationReport::new(confusion, auc, threshold, train_rows.len());
        info!(
            version,
            model_type = classifier.kind().as_str(),
            precision = report.precision,
            recall = report.recall,
            f1 = report.f1,
            roc_auc = ?report.roc_auc,
            threshold,
            "Model trained"
        );

        let artifact = ModelArtifact {
            version: version.to_string(),
            classifier,
            scaler,
            feature_names: matrix.feature_names,
            threshold,
            saved_at: Utc::now(),
            metrics: report.to_metrics(),
        };

        Ok(TrainingOutcome { artifact, report })
    }

    pub fn save_model(&self, artifact: &ModelArtifact) -> TrainingResult<()> {
        self.artifacts.save(artifact)?;
        Ok(())
    }

    /// Loads `version`, or the active version when `None`.
    pub fn load_model(&self, version: Option<&str>) -> TrainingResult<ModelArtifact> {
        let artifact = match version {
            Some(version) => self.artifacts.load(version)?,
            None => self.artifacts.load_latest()?,
        };
        Ok(artifact)
    }

    /// Load, train and save under a fresh timestamp version.
    pub fn run(&self, store: &MatchingStore) -> TrainingResult<TrainingOutcome> {
        let records = self.load_training_data(store)?;
        let version = timestamp_version();
        let outcome = self.train(&records, &version)?;
        if outcome.report.f1 == 0.0 {
            warn!(version = %version, "Trained model has zero F1 on the held-out split");
        }
        self.save_model(&outcome.artifact)?;
        Ok(outcome)
    }
}

/// `v%Y%m%d_%H%M%S` in UTC.
pub fn timestamp_version() -> String {
    Utc::now().format("v%Y%m%d_%H%M%S").to_string()
}
