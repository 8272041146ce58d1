//! Heuristic classifier used when no trained artifact is available.
//!
//! Scores come from semantic similarity alone:
//! `p_grounded = sim`, `p_hallucinated = 1 - sim`, and `p_partial` peaks at
//! `sim = 0.5` and vanishes at both ends. The three are normalized to sum
//! to one.

use super::{Classifier, ClassifierKind};
use crate::features::FeatureVector;
use crate::types::{ClassProbabilities, Label, Prediction};

const NORMALIZATION_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackHeuristic;

impl FallbackHeuristic {
    pub fn new() -> Self {
        Self
    }
}

impl Classifier for FallbackHeuristic {
    fn predict_proba(&self, features: &FeatureVector) -> ClassProbabilities {
        let sim = features.semantic_similarity();
        // NaN compares false everywhere; treat it as no similarity.
        let sim = if sim.is_nan() { 0.0 } else { sim.clamp(0.0, 1.0) };

        let grounded = sim;
        let hallucinated = 1.0 - sim;
        let partial = (0.5 - (sim - 0.5).abs()).clamp(0.0, 0.5);

        let total = grounded + partial + hallucinated + NORMALIZATION_EPSILON;
        [grounded / total, partial / total, hallucinated / total]
    }

    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Fallback
    }

    /// Argmax with ties to the lowest index, except that a tie involving
    /// `partially_grounded` resolves to it. The only tie this heuristic can
    /// produce is the three-way tie at `sim = 0.5`, which is the point of
    /// maximum uncertainty.
    fn predict(&self, features: &FeatureVector) -> Prediction {
        let probabilities = self.predict_proba(features);
        let mut prediction = Prediction::from_probabilities(probabilities);
        let partial = probabilities[Label::PartiallyGrounded.index()];
        if probabilities.iter().all(|p| *p <= partial) {
            prediction.label = Label::PartiallyGrounded;
        }
        prediction
    }
}
