//! Barter matching library crate (used by the offline binary and integration tests).
//!
//! # Public API Surface
//!
//! ## Online scoring
//! - [`HybridMatcher`] - Full pipeline: rules, features, classifier, semantic similarity
//! - [`ScoreCombiner`], [`CombinerWeights`] - Weighted blending with redistribution
//! - [`RuleBasedMatcher`], [`CategoryFilter`] - Deterministic rule scoring
//! - [`SemanticEmbedder`] - Embedding similarity with a lexical fallback
//! - [`ModelPredictor`] - Classifier serving with a heuristic fallback
//!
//! ## Data and training
//! - [`MatchingStore`], [`MatchingRecord`] - Append-only labeled-pair log
//! - [`ModelTrainer`], [`ThresholdTuner`] - Offline training and threshold search
//! - [`ArtifactStore`], [`ModelArtifact`] - Versioned model bundles
//!
//! ## Feedback and diagnostics
//! - [`FeedbackManager`], [`FeedbackLog`] - User feedback and the retrain trigger
//! - [`Diagnostics`] - Outliers, consistency checks and labeling candidates
//!
//! ## Test/Mock Support
//! [`MockEmbeddingBackend`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod embedding;
pub mod features;
pub mod feedback;
pub mod hashing;
pub mod model;
pub mod rules;
pub mod scoring;
pub mod training;

pub use config::{ConfigError, EngineConfig};
pub use diagnostics::{
    ConsistencyCase, ConsistencyReport, DiagnosticReport, Diagnostics, DiagnosticsConfig,
    DiagnosticsError, DivergenceDistribution, Outlier,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbeddingBackend;
pub use embedding::{
    BackendKind, BertBackend, EmbedderConfig, EmbedderRegistry, EmbeddingBackend,
    EmbeddingError, LexicalBackend, SemanticEmbedder,
};
pub use features::{
    FeatureExtractor, MatchingFeatures, MatchingRecord, MatchingStore, StoreError,
    SynonymDictionary,
};
pub use feedback::{
    CommitReport, FeedbackAction, FeedbackEntry, FeedbackError, FeedbackLog, FeedbackManager,
    FeedbackStats, RuntimeMetrics,
};
pub use hashing::pair_id;
pub use model::{
    ArtifactStore, Classifier, ClassifierKind, ModelArtifact, ModelError, ModelPredictor,
    PredictorConfig, StandardScaler,
};
pub use rules::{
    CategoryConfig, CategoryFilter, ContextualKeywords, MorphologyProcessor, RuleBasedMatcher,
    RuleScore, RulesError,
};
pub use scoring::{
    CombinerWeights, HybridMatcher, MatchOutcome, MatchRequest, ScoreCombiner, ScoringError,
};
pub use training::{
    EvaluationReport, ModelTrainer, ThresholdTuner, TrainerConfig, TrainingError, TuneMetric,
    TunerConfig,
};
