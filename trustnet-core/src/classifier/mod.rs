//! # Classifier
//!
//! Turns a [`FeatureVector`] into class probabilities. Two implementations
//! share the [`Classifier`] trait:
//!
//! - [`TrainedClassifier`]: a pre-fitted model read from a JSON artifact.
//! - [`FallbackHeuristic`]: a similarity-driven heuristic used whenever the
//!   artifact cannot be loaded.
//!
//! The variant is chosen once, by [`load_classifier`], and the choice is
//! logged and reported through [`Classifier::kind`].

mod artifact;
mod fallback;
mod trained;

pub use artifact::{ARTIFACT_FORMAT_VERSION, ModelArtifact, ModelSpec, TreeNode};
pub use fallback::FallbackHeuristic;
pub use trained::TrainedClassifier;

use crate::features::FeatureVector;
use crate::types::{ClassProbabilities, Prediction};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Which classifier variant produced a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    Trained,
    Fallback,
}

impl ClassifierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trained => "trained",
            Self::Fallback => "fallback",
        }
    }
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A probabilistic three-class scorer over feature vectors.
pub trait Classifier: Send + Sync {
    /// Class probabilities in label-map order, summing to 1.0.
    fn predict_proba(&self, features: &FeatureVector) -> ClassProbabilities;

    /// Which variant this is.
    fn kind(&self) -> ClassifierKind;

    /// Most likely label plus the trust score. Ties go to the lowest class
    /// index.
    fn predict(&self, features: &FeatureVector) -> Prediction {
        Prediction::from_probabilities(self.predict_proba(features))
    }
}

/// Load the trained classifier at `path`, or fall back to the heuristic.
///
/// Never fails: a missing, unreadable or incompatible artifact selects
/// [`FallbackHeuristic`] and logs why.
pub fn load_classifier(path: &Path) -> Arc<dyn Classifier> {
    match TrainedClassifier::load(path) {
        Ok(classifier) => {
            tracing::info!(
                path = %path.display(),
                model = classifier.model_type(),
                classifier = %ClassifierKind::Trained,
                "Loaded trained classifier"
            );
            Arc::new(classifier)
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                classifier = %ClassifierKind::Fallback,
                "Classifier artifact unavailable, fallback heuristic active"
            );
            Arc::new(FallbackHeuristic::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Label;

    const LOGISTIC_ARTIFACT: &str = r#"{
        "format_version": 1,
        "feature_names": ["semantic_similarity", "entity_overlap", "self_consistency", "entropy"],
        "classes": ["grounded", "partially_grounded", "hallucinated"],
        "model": {
            "type": "logistic",
            "coefficients": [[6.0, 3.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0], [-6.0, -3.0, 0.0, 0.0]],
            "intercepts": [-4.0, 0.0, 4.0]
        }
    }"#;

    #[test]
    fn test_missing_artifact_selects_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let classifier = load_classifier(&dir.path().join("missing.json"));
        assert_eq!(classifier.kind(), ClassifierKind::Fallback);

        let p = classifier.predict(&FeatureVector::new([1.0, 1.0, 0.0, 0.0]));
        assert_eq!(p.label, Label::Grounded);
    }

    #[test]
    fn test_corrupt_artifact_selects_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xgb.pkl");
        std::fs::write(&path, b"\x80\x04\x95 not json").unwrap();
        assert_eq!(load_classifier(&path).kind(), ClassifierKind::Fallback);
    }

    #[test]
    fn test_valid_artifact_selects_trained() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classifier.json");
        std::fs::write(&path, LOGISTIC_ARTIFACT).unwrap();

        let classifier = load_classifier(&path);
        assert_eq!(classifier.kind(), ClassifierKind::Trained);

        let p = classifier.predict(&FeatureVector::new([0.95, 1.0, 0.0, 0.0]));
        assert_eq!(p.label, Label::Grounded);
        let p = classifier.predict(&FeatureVector::new([0.1, 0.0, 0.0, 0.0]));
        assert_eq!(p.label, Label::Hallucinated);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ClassifierKind::Trained.to_string(), "trained");
        assert_eq!(
            serde_json::to_string(&ClassifierKind::Fallback).unwrap(),
            "\"fallback\""
        );
    }
}
