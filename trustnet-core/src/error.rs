//! Error types for the TrustNet core library.
//!
//! Uses `thiserror` for structured variants covering collaborator failures
//! during signal extraction, classifier artifact loading, configuration and
//! offline dataset handling.

use std::path::PathBuf;

/// Top-level error type for the TrustNet core library.
#[derive(Debug, thiserror::Error)]
pub enum TrustNetError {
    #[error("Signal error: {0}")]
    Signal(#[from] SignalError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of the external collaborators a signal depends on.
///
/// These are never coerced into a score: a signal that cannot be computed
/// fails the whole evaluation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("embedding service failed: {0}")]
    Embedding(String),

    #[error("entity extraction failed: {0}")]
    EntityExtraction(String),

    #[error("{collaborator} did not respond within {timeout_secs}s")]
    Timeout {
        collaborator: &'static str,
        timeout_secs: u64,
    },
}

impl SignalError {
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    pub fn entity_extraction(msg: impl Into<String>) -> Self {
        Self::EntityExtraction(msg.into())
    }

    /// Whether the failure was a timeout rather than an explicit error.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Reasons a trained classifier artifact could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("artifact not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported artifact format version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("feature columns {found:?} do not match expected {expected:?}")]
    FeatureMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("artifact classes {found:?} are not a permutation of the label map")]
    LabelMapMismatch { found: Vec<String> },

    #[error("malformed model: {0}")]
    Shape(String),
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

/// Errors raised while reading or writing evaluation datasets.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}:{line}: {message}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("dataset is empty")]
    Empty,
}

/// Result alias for TrustNet operations.
pub type Result<T> = std::result::Result<T, TrustNetError>;
