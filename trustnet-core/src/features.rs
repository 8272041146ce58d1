//! Feature vector assembly.
//!
//! Column order is a contract with every trained artifact: classifiers index
//! the vector positionally, and artifacts declare the names they were trained
//! on. Changing the order or adding a column requires bumping
//! [`FEATURE_SCHEMA_VERSION`].

use crate::config::TrustNetConfig;
use crate::embeddings::{Embedder, create_embedder};
use crate::entities::{EntityExtractor, create_entity_extractor};
use crate::error::{ConfigError, SignalError};
use crate::signals::{self, ENTROPY_PLACEHOLDER, SELF_CONSISTENCY_PLACEHOLDER};
use crate::types::SignalScores;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Version of the feature column layout.
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// Number of feature columns.
pub const FEATURE_COUNT: usize = 4;

/// Canonical column names, in order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "semantic_similarity",
    "entity_overlap",
    "self_consistency",
    "entropy",
];

pub const SEMANTIC_SIMILARITY: usize = 0;
pub const ENTITY_OVERLAP: usize = 1;
pub const SELF_CONSISTENCY: usize = 2;
pub const ENTROPY: usize = 3;

/// Ordered signal values for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }

    /// Copy of this vector with one column replaced.
    pub fn with(&self, index: usize, value: f64) -> Self {
        let mut values = self.0;
        values[index] = value;
        Self(values)
    }

    pub fn semantic_similarity(&self) -> f64 {
        self.0[SEMANTIC_SIMILARITY]
    }

    pub fn entity_overlap(&self) -> f64 {
        self.0[ENTITY_OVERLAP]
    }

    /// Named view for the API boundary.
    pub fn signals(&self) -> SignalScores {
        SignalScores {
            semantic_similarity: self.0[SEMANTIC_SIMILARITY],
            entity_overlap: self.0[ENTITY_OVERLAP],
            self_consistency: self.0[SELF_CONSISTENCY],
            entropy: self.0[ENTROPY],
        }
    }
}

impl From<SignalScores> for FeatureVector {
    fn from(s: SignalScores) -> Self {
        Self([
            s.semantic_similarity,
            s.entity_overlap,
            s.self_consistency,
            s.entropy,
        ])
    }
}

/// Builds feature vectors by running every signal against its collaborator.
#[derive(Clone)]
pub struct FeatureBuilder {
    embedder: Arc<dyn Embedder>,
    extractor: Arc<dyn EntityExtractor>,
    timeout: Option<Duration>,
}

impl FeatureBuilder {
    pub fn new(embedder: Arc<dyn Embedder>, extractor: Arc<dyn EntityExtractor>) -> Self {
        Self {
            embedder,
            extractor,
            timeout: None,
        }
    }

    /// Collaborators and timeout as configured.
    pub fn from_config(config: &TrustNetConfig) -> Result<Self, ConfigError> {
        let embedder = create_embedder(&config.embedding)?;
        let extractor = create_entity_extractor(&config.entities)?;
        Ok(Self::new(Arc::from(embedder), Arc::from(extractor))
            .with_timeout(Duration::from_secs(config.signals.timeout_secs)))
    }

    /// Bound every collaborator call. A zero duration disables the limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.provider_name()
    }

    pub fn extractor_name(&self) -> &str {
        self.extractor.provider_name()
    }

    /// Compute the feature vector for one sample.
    ///
    /// `question` is not consumed by any current signal; it is part of the
    /// signature so question-aware signals can be added without touching
    /// callers.
    pub async fn build(
        &self,
        _question: &str,
        context: &str,
        answer: &str,
    ) -> Result<FeatureVector, SignalError> {
        let semantic =
            signals::semantic_similarity(self.embedder.as_ref(), answer, context, self.timeout)
                .await?;
        let overlap =
            signals::entity_overlap(self.extractor.as_ref(), answer, context, self.timeout).await?;

        Ok(FeatureVector([
            semantic,
            overlap,
            SELF_CONSISTENCY_PLACEHOLDER,
            ENTROPY_PLACEHOLDER,
        ]))
    }
}

impl std::fmt::Debug for FeatureBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeatureBuilder")
            .field("embedder", &self.embedder.provider_name())
            .field("extractor", &self.extractor.provider_name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
