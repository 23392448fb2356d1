//! Offline training: data checks, feature assembly, stratified split, fitting,
//! evaluation, threshold tuning and versioned persistence.

pub mod error;
pub mod metrics;
pub mod split;
pub mod trainer;
pub mod tuner;


pub use error::{TrainingError, TrainingResult};
pub use metrics::{ConfusionMatrix, EvaluationReport, roc_auc};
pub use split::stratified_split;
pub use trainer::{FeatureMatrix, ModelTrainer, TrainerConfig, TrainingOutcome, timestamp_version};
pub use tuner::{ThresholdTuner, TuneMetric, TunerConfig, TuningResult};
