use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::embedding::{EmbedderRegistry, SemanticEmbedder};
use crate::features::{
    FeatureExtractor, MatchingFeatures, MatchingRecord, MatchingStore, SynonymDictionary,
    extended_feature_map,
};
use crate::model::ModelPredictor;
use crate::rules::{
    CategoryFilter, ContextualKeywords, MorphologyProcessor, RuleBasedMatcher, RuleScore,
};

use super::combiner::{CombinerWeights, ScoreCombiner};
use super::error::ScoringError;
use super::types::{MatchOutcome, MatchRequest, ScoreComponents};

/// The online scoring pipeline: rules, features, classifier and semantic
/// similarity blended into one decision.
///
/// Evaluation never fails: each stage degrades to its fallback. Embedding
/// backends can block, so async callers should go through
/// [`evaluate_blocking_offload`](Self::evaluate_blocking_offload).
#[derive(Debug, Clone)]
pub struct HybridMatcher {
    extractor: Arc<FeatureExtractor>,
    embedder: Arc<SemanticEmbedder>,
    predictor: Arc<ModelPredictor>,
    combiner: ScoreCombiner,
    decision_threshold: f64,
    use_semantic: bool,
}

impl HybridMatcher {
    pub fn new(
        extractor: Arc<FeatureExtractor>,
        embedder: Arc<SemanticEmbedder>,
        predictor: Arc<ModelPredictor>,
    ) -> Self {
        Self {
            extractor,
            embedder,
            predictor,
            combiner: ScoreCombiner::default(),
            decision_threshold: crate::constants::DEFAULT_DECISION_THRESHOLD,
            use_semantic: true,
        }
    }

    /// Builds the full pipeline from configuration. The embedder comes from the
    /// process-wide registry; the model loads lazily on first prediction.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ScoringError> {
        let categories = match &config.categories_path {
            Some(path) => CategoryFilter::from_json_file(path)?,
            None => CategoryFilter::with_defaults(),
        };
        let morphology = MorphologyProcessor::from_optional_dictionary(
            config.lemma_dictionary.as_deref(),
        )?;
        let matcher = RuleBasedMatcher::new(categories, ContextualKeywords::new(), morphology);

        let mut extractor = FeatureExtractor::new(Arc::new(matcher));
        if let Some(path) = &config.synonyms_path {
            extractor = extractor.with_synonyms(SynonymDictionary::from_json_file(path)?);
        }

        let embedder = EmbedderRegistry::global().get_or_load(&config.embedder_config());
        let predictor = Arc::new(ModelPredictor::new(config.predictor_config()));

        info!(
            embedding_backend = %embedder.backend_kind(),
            embedding_model = embedder.model_name(),
            model_dir = %config.model_dir.display(),
            "Hybrid matcher configured"
        );

        Ok(Self::new(Arc::new(extractor), embedder, predictor)
            .with_weights(CombinerWeights::new(
                config.rule_weight,
                config.ml_weight,
                config.semantic_weight,
            ))
            .with_decision_threshold(config.decision_threshold))
    }

    pub fn with_weights(mut self, weights: CombinerWeights) -> Self {
        self.combiner = ScoreCombiner::new(weights);
        self
    }

    pub fn with_combiner(mut self, combiner: ScoreCombiner) -> Self {
        self.combiner = combiner;
        self
    }

    pub fn with_decision_threshold(mut self, threshold: f64) -> Self {
        self.decision_threshold = threshold;
        self
    }

    /// Skips the embedder; the semantic weight is redistributed.
    pub fn without_semantic(mut self) -> Self {
        self.use_semantic = false;
        self
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn embedder(&self) -> &SemanticEmbedder {
        &self.embedder
    }

    pub fn predictor(&self) -> &ModelPredictor {
        &self.predictor
    }

    pub fn combiner(&self) -> &ScoreCombiner {
        &self.combiner
    }

    pub fn decision_threshold(&self) -> f64 {
        self.decision_threshold
    }

    pub fn evaluate(
        &self,
        text1: &str,
        text2: &str,
        category1: &str,
        category2: &str,
        base_score: Option<f64>,
    ) -> MatchOutcome {
        let request = MatchRequest {
            text1: text1.to_string(),
            text2: text2.to_string(),
            category1: category1.to_string(),
            category2: category2.to_string(),
            base_score,
        };
        self.evaluate_request(&request)
    }

    pub fn evaluate_request(&self, request: &MatchRequest) -> MatchOutcome {
        let prepared = self.prepare(request);
        let semantic = self
            .use_semantic
            .then(|| self.embedder.similarity(&request.text1, &request.text2));
        let map = extended_feature_map(
            &prepared.features,
            &prepared.category1,
            &prepared.category2,
            semantic,
        );
        let ml_score = self.predictor.predict(&map, true);
        self.finish(request, prepared, ml_score, semantic)
    }

    /// Scores many pairs; semantic similarity and prediction run batched.
    pub fn evaluate_batch(&self, requests: &[MatchRequest]) -> Vec<MatchOutcome> {
        if requests.is_empty() {
            return Vec::new();
        }

        let prepared: Vec<Prepared> = requests.iter().map(|r| self.prepare(r)).collect();

        let semantic: Vec<Option<f64>> = if self.use_semantic {
            let pairs: Vec<(&str, &str)> = requests
                .iter()
                .map(|r| (r.text1.as_str(), r.text2.as_str()))
                .collect();
            self.embedder
                .batch_similarity(&pairs)
                .into_iter()
                .map(Some)
                .collect()
        } else {
            vec![None; requests.len()]
        };

        let maps: Vec<HashMap<String, f64>> = prepared
            .iter()
            .zip(&semantic)
            .map(|(p, s)| extended_feature_map(&p.features, &p.category1, &p.category2, *s))
            .collect();
        let ml_scores = self.predictor.predict_batch(&maps, true);

        debug!(pairs = requests.len(), "Batch evaluated");

        requests
            .iter()
            .zip(prepared)
            .zip(ml_scores.into_iter().zip(semantic))
            .map(|((request, prepared), (ml, sem))| self.finish(request, prepared, ml, sem))
            .collect()
    }

    /// Runs [`evaluate_request`](Self::evaluate_request) on tokio's blocking pool.
    pub async fn evaluate_blocking_offload(
        self: &Arc<Self>,
        request: MatchRequest,
    ) -> Result<MatchOutcome, ScoringError> {
        let matcher = Arc::clone(self);
        let outcome =
            tokio::task::spawn_blocking(move || matcher.evaluate_request(&request)).await?;
        Ok(outcome)
    }

    /// Evaluates the pair and appends its record to `store`.
    pub fn record_pair(
        &self,
        store: &mut MatchingStore,
        request: &MatchRequest,
    ) -> Result<MatchOutcome, ScoringError> {
        let outcome = self.evaluate_request(request);

        let mut record = MatchingRecord::new(
            outcome.pair_id.clone(),
            request.text1.clone(),
            request.text2.clone(),
            outcome.category1.clone(),
            outcome.category2.clone(),
            outcome.components.features,
        );
        if let Some(similarity) = outcome.components.semantic_score {
            record = record.with_semantic_similarity(similarity);
        }
        store.add(record)?;

        Ok(outcome)
    }

    fn resolve_category(&self, category: &str, text: &str) -> String {
        let category = category.trim();
        if !category.is_empty() {
            return category.to_string();
        }
        self.extractor
            .matcher()
            .categories()
            .infer_category(text)
            .map(str::to_string)
            .unwrap_or_default()
    }

    fn prepare(&self, request: &MatchRequest) -> Prepared {
        let category1 = self.resolve_category(&request.category1, &request.text1);
        let category2 = self.resolve_category(&request.category2, &request.text2);
        let (features, rule) = self.extractor.extract(
            &request.text1,
            &request.text2,
            &category1,
            &category2,
            request.base_score,
        );
        Prepared {
            category1,
            category2,
            features,
            rule,
        }
    }

    fn finish(
        &self,
        request: &MatchRequest,
        prepared: Prepared,
        ml_score: f64,
        semantic: Option<f64>,
    ) -> MatchOutcome {
        let total_score = self.combiner.combine(prepared.rule.total, ml_score, semantic);
        let is_match = total_score >= self.decision_threshold;

        debug!(
            rule = prepared.rule.total,
            ml = ml_score,
            semantic = ?semantic,
            total = total_score,
            is_match,
            "Pair evaluated"
        );

        MatchOutcome {
            pair_id: crate::hashing::pair_id(
                &request.text1,
                &request.text2,
                &prepared.category1,
                &prepared.category2,
            ),
            category1: prepared.category1,
            category2: prepared.category2,
            total_score,
            is_valid: prepared.rule.is_valid,
            is_match,
            components: ScoreComponents {
                rule: prepared.rule,
                ml_score,
                semantic_score: semantic,
                features: prepared.features,
            },
        }
    }
}

struct Prepared {
    category1: String,
    category2: String,
    features: MatchingFeatures,
    rule: RuleScore,
}
