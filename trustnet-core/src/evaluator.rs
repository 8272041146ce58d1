//! Evaluation orchestration.
//!
//! [`Evaluator`] is the canonical pipeline: features → classifier → decision.
//! [`SignalMeanEvaluator`] is a stand-in that averages two signals and never
//! consults a classifier; it is kept as its own type and only runs when
//! `evaluation.mode = "signal_mean"` is configured.

use crate::classifier::{Classifier, ClassifierKind, load_classifier};
use crate::config::{EvaluationMode, TrustNetConfig};
use crate::decision::decide;
use crate::error::{ConfigError, SignalError};
use crate::features::{FeatureBuilder, FeatureVector};
use crate::types::{EvaluationResult, Label, SignalScores, round4};
use std::sync::Arc;
use tracing::{debug, warn};

/// Classifier-backed evaluator.
#[derive(Clone)]
pub struct Evaluator {
    features: FeatureBuilder,
    classifier: Arc<dyn Classifier>,
}

impl Evaluator {
    pub fn new(features: FeatureBuilder, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            features,
            classifier,
        }
    }

    pub fn classifier(&self) -> &Arc<dyn Classifier> {
        &self.classifier
    }

    pub fn features(&self) -> &FeatureBuilder {
        &self.features
    }

    /// Score one answer: label, trust score, display decision and signals.
    #[tracing::instrument(name = "evaluate", skip_all, fields(classifier = %self.classifier.kind()))]
    pub async fn evaluate(
        &self,
        question: &str,
        context: &str,
        answer: &str,
    ) -> Result<EvaluationResult, SignalError> {
        let features = self.features.build(question, context, answer).await?;
        Ok(self.evaluate_features(&features))
    }

    /// Classification and decision for an already-built feature vector.
    pub fn evaluate_features(&self, features: &FeatureVector) -> EvaluationResult {
        let prediction = self.classifier.predict(features);
        let trust_score = round4(prediction.trust_score);
        let decision = decide(prediction.trust_score);

        debug!(
            label = %prediction.label,
            trust_score,
            decision = %decision,
            classifier = %self.classifier.kind(),
            "Evaluated answer"
        );

        EvaluationResult {
            label: prediction.label,
            trust_score,
            decision,
            signals: features.signals(),
        }
    }

    /// Signals only; no classification.
    pub async fn evaluate_signals(
        &self,
        question: &str,
        context: &str,
        answer: &str,
    ) -> Result<SignalScores, SignalError> {
        Ok(self
            .features
            .build(question, context, answer)
            .await?
            .signals())
    }
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("features", &self.features)
            .field("classifier", &self.classifier.kind())
            .finish()
    }
}

/// Placeholder evaluator: trust score is the mean of semantic similarity and
/// entity overlap, and the label is always [`SignalMeanEvaluator::LABEL`].
#[derive(Debug, Clone)]
pub struct SignalMeanEvaluator {
    features: FeatureBuilder,
}

impl SignalMeanEvaluator {
    /// No classification happens, so the label carries no information.
    pub const LABEL: Label = Label::PartiallyGrounded;

    pub fn new(features: FeatureBuilder) -> Self {
        warn!("Signal-mean placeholder evaluator active; labels are constant");
        Self { features }
    }

    pub async fn evaluate(
        &self,
        question: &str,
        context: &str,
        answer: &str,
    ) -> Result<EvaluationResult, SignalError> {
        let features = self.features.build(question, context, answer).await?;
        let trust = (features.semantic_similarity() + features.entity_overlap()) / 2.0;
        let trust_score = round4(trust);
        Ok(EvaluationResult {
            label: Self::LABEL,
            trust_score,
            decision: decide(trust),
            signals: features.signals(),
        })
    }

    pub async fn evaluate_signals(
        &self,
        question: &str,
        context: &str,
        answer: &str,
    ) -> Result<SignalScores, SignalError> {
        Ok(self
            .features
            .build(question, context, answer)
            .await?
            .signals())
    }
}

/// The pipeline selected at startup.
#[derive(Debug, Clone)]
pub enum EvaluationPipeline {
    Classifier(Evaluator),
    SignalMean(SignalMeanEvaluator),
}

impl EvaluationPipeline {
    /// Build collaborators, load the classifier and select the pipeline.
    pub fn from_config(config: &TrustNetConfig) -> Result<Self, ConfigError> {
        let features = FeatureBuilder::from_config(config)?;

        Ok(match config.evaluation.mode {
            EvaluationMode::Classifier => {
                let classifier = load_classifier(&config.classifier.artifact_path);
                Self::Classifier(Evaluator::new(features, classifier))
            }
            EvaluationMode::SignalMean => Self::SignalMean(SignalMeanEvaluator::new(features)),
        })
    }

    pub async fn evaluate(
        &self,
        question: &str,
        context: &str,
        answer: &str,
    ) -> Result<EvaluationResult, SignalError> {
        match self {
            Self::Classifier(e) => e.evaluate(question, context, answer).await,
            Self::SignalMean(e) => e.evaluate(question, context, answer).await,
        }
    }

    pub async fn evaluate_signals(
        &self,
        question: &str,
        context: &str,
        answer: &str,
    ) -> Result<SignalScores, SignalError> {
        match self {
            Self::Classifier(e) => e.evaluate_signals(question, context, answer).await,
            Self::SignalMean(e) => e.evaluate_signals(question, context, answer).await,
        }
    }

    pub fn mode(&self) -> EvaluationMode {
        match self {
            Self::Classifier(_) => EvaluationMode::Classifier,
            Self::SignalMean(_) => EvaluationMode::SignalMean,
        }
    }

    /// Classifier variant in use, if the pipeline has one.
    pub fn classifier_kind(&self) -> Option<ClassifierKind> {
        match self {
            Self::Classifier(e) => Some(e.classifier().kind()),
            Self::SignalMean(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::FallbackHeuristic;
    use crate::embeddings::{Embedder, LocalEmbedder};
    use crate::entities::{EntityExtractor, PatternEntityExtractor};
    use crate::types::{ClassProbabilities, Decision};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    /// Embeds every text as a unit vector at a fixed angle from the first.
    struct AngleEmbedder {
        cosine: f32,
    }

    #[async_trait]
    impl Embedder for AngleEmbedder {
        async fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SignalError> {
            let sin = (1.0 - self.cosine * self.cosine).sqrt();
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, _)| {
                    if i == 0 {
                        vec![1.0, 0.0]
                    } else {
                        vec![self.cosine, sin]
                    }
                })
                .collect())
        }

        fn provider_name(&self) -> &str {
            "angle"
        }
    }

    struct MapExtractor;

    #[async_trait]
    impl EntityExtractor for MapExtractor {
        async fn extract(&self, text: &str) -> Result<HashSet<String>, SignalError> {
            let entities: &[&str] = match text {
                "Paris" => &["paris"],
                "Berlin" => &["berlin"],
                "The capital of France is Paris." => &["france", "paris"],
                _ => &[],
            };
            Ok(entities.iter().map(|s| s.to_string()).collect())
        }

        fn provider_name(&self) -> &str {
            "map"
        }
    }

    struct DownEmbedder;

    #[async_trait]
    impl Embedder for DownEmbedder {
        async fn encode(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, SignalError> {
            Err(SignalError::embedding("model server unreachable"))
        }

        fn provider_name(&self) -> &str {
            "down"
        }
    }

    struct ConstantClassifier(ClassProbabilities);

    impl Classifier for ConstantClassifier {
        fn predict_proba(&self, _features: &FeatureVector) -> ClassProbabilities {
            self.0
        }

        fn kind(&self) -> ClassifierKind {
            ClassifierKind::Trained
        }
    }

    fn features(cosine: f32) -> FeatureBuilder {
        FeatureBuilder::new(Arc::new(AngleEmbedder { cosine }), Arc::new(MapExtractor))
    }

    const CONTEXT: &str = "The capital of France is Paris.";

    #[tokio::test]
    async fn test_grounded_answer_with_fallback() {
        let evaluator = Evaluator::new(features(1.0), Arc::new(FallbackHeuristic::new()));
        let result = evaluator
            .evaluate("What is the capital of France?", CONTEXT, "Paris")
            .await
            .unwrap();
        assert_eq!(result.label, Label::Grounded);
        assert_eq!(result.decision, Decision::Show);
        assert_eq!(result.signals.entity_overlap, 1.0);
        assert_eq!(result.signals.semantic_similarity, 1.0);
    }

    #[tokio::test]
    async fn test_hallucinated_answer_is_flagged() {
        // cosine -0.4 → semantic similarity 0.3
        let evaluator = Evaluator::new(features(-0.4), Arc::new(FallbackHeuristic::new()));
        let result = evaluator
            .evaluate("What is the capital of France?", CONTEXT, "Berlin")
            .await
            .unwrap();
        assert_eq!(result.signals.entity_overlap, 0.0);
        assert_eq!(result.signals.semantic_similarity, 0.3);
        assert_eq!(result.label, Label::Hallucinated);
        assert_eq!(result.decision, Decision::Flag);
    }

    #[tokio::test]
    async fn test_trust_score_is_rounded_and_decision_uses_it() {
        let clf = ConstantClassifier([0.812345, 0.1, 0.087655]);
        let evaluator = Evaluator::new(features(1.0), Arc::new(clf));
        let result = evaluator.evaluate("q", CONTEXT, "Paris").await.unwrap();
        assert_eq!(result.trust_score, 0.8123);
        assert_eq!(result.decision, Decision::Show);
        assert_eq!(result.label, Label::Grounded);
    }

    #[tokio::test]
    async fn test_signals_only_path() {
        let evaluator = Evaluator::new(features(0.0), Arc::new(FallbackHeuristic::new()));
        let signals = evaluator
            .evaluate_signals("q", CONTEXT, "Berlin")
            .await
            .unwrap();
        assert_eq!(signals.semantic_similarity, 0.5);
        assert_eq!(signals.entity_overlap, 0.0);
        assert_eq!(signals.self_consistency, 0.0);
        assert_eq!(signals.entropy, 0.0);
    }

    #[tokio::test]
    async fn test_collaborator_failure_propagates() {
        let builder = FeatureBuilder::new(Arc::new(DownEmbedder), Arc::new(MapExtractor));
        let evaluator = Evaluator::new(builder, Arc::new(FallbackHeuristic::new()));
        let err = evaluator.evaluate("q", CONTEXT, "Paris").await.unwrap_err();
        assert!(matches!(err, SignalError::Embedding(_)));
        assert!(evaluator.evaluate_signals("q", CONTEXT, "Paris").await.is_err());
    }

    #[tokio::test]
    async fn test_signal_mean_placeholder() {
        // similarity 0.3, overlap 0.0 → mean 0.15
        let evaluator = SignalMeanEvaluator::new(features(-0.4));
        let result = evaluator.evaluate("q", CONTEXT, "Berlin").await.unwrap();
        assert_eq!(result.trust_score, 0.15);
        assert_eq!(result.label, SignalMeanEvaluator::LABEL);
        assert_eq!(result.decision, Decision::Flag);

        let result = evaluator.evaluate("q", CONTEXT, "Paris").await.unwrap();
        // similarity 0.3, overlap 1.0 → 0.65
        assert_eq!(result.trust_score, 0.65);
        assert_eq!(result.decision, Decision::ShowWithWarning);
        assert_eq!(result.label, SignalMeanEvaluator::LABEL);
    }

    #[tokio::test]
    async fn test_pipeline_from_default_config() {
        let mut config = TrustNetConfig::default();
        let dir = tempfile::tempdir().unwrap();
        config.classifier.artifact_path = dir.path().join("absent.json");

        let pipeline = EvaluationPipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.mode(), EvaluationMode::Classifier);
        assert_eq!(pipeline.classifier_kind(), Some(ClassifierKind::Fallback));

        let result = pipeline
            .evaluate("What is the capital of France?", CONTEXT, "Paris")
            .await
            .unwrap();
        assert!((0.0..=1.0).contains(&result.trust_score));
        assert_eq!(result.signals.entity_overlap, 1.0);
    }

    #[tokio::test]
    async fn test_pipeline_signal_mean_mode() {
        let mut config = TrustNetConfig::default();
        config.evaluation.mode = EvaluationMode::SignalMean;
        let pipeline = EvaluationPipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.mode(), EvaluationMode::SignalMean);
        assert_eq!(pipeline.classifier_kind(), None);

        let signals = pipeline
            .evaluate_signals("q", CONTEXT, "Paris")
            .await
            .unwrap();
        assert_eq!(signals.entity_overlap, 1.0);
    }

    #[test]
    fn test_pipeline_rejects_unknown_provider() {
        let mut config = TrustNetConfig::default();
        config.embedding.provider = "magic".into();
        assert!(EvaluationPipeline::from_config(&config).is_err());
    }

    #[test]
    fn test_local_collaborators_are_default() {
        let builder = FeatureBuilder::new(
            Arc::new(LocalEmbedder::new(64)),
            Arc::new(PatternEntityExtractor::new()),
        );
        assert_eq!(builder.embedder_name(), "local");
        assert_eq!(builder.extractor_name(), "pattern");
    }
}
