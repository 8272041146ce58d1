//! # TrustNet Core
//!
//! Groundedness scoring for generated answers. Given a question, the context
//! an answer should be grounded in, and the answer itself, TrustNet extracts
//! a fixed feature vector of signals, classifies the answer as grounded,
//! partially grounded or hallucinated, and maps the resulting trust score to
//! a display decision.
//!
//! The online path lives in [`evaluator`]; [`dataset`] holds the offline
//! tooling that scores classifiers and baselines over labeled data.

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod decision;
pub mod embeddings;
pub mod entities;
pub mod error;
pub mod evaluator;
pub mod features;
pub mod signals;
pub mod types;

// Re-export commonly used types at the crate root.
pub use classifier::{
    Classifier, ClassifierKind, FallbackHeuristic, TrainedClassifier, load_classifier,
};
pub use config::{EvaluationMode, TrustNetConfig, load_config};
pub use decision::decide;
pub use embeddings::{Embedder, create_embedder};
pub use entities::{EntityExtractor, create_entity_extractor};
pub use error::{ArtifactError, ConfigError, DatasetError, Result, SignalError, TrustNetError};
pub use evaluator::{EvaluationPipeline, Evaluator, SignalMeanEvaluator};
pub use features::{FEATURE_NAMES, FEATURE_SCHEMA_VERSION, FeatureBuilder, FeatureVector};
pub use types::{Decision, EvaluationResult, Label, Prediction, SignalScores};
