//! Configuration system for TrustNet.
//!
//! Uses `figment` for layered configuration: defaults -> user config ->
//! workspace config -> explicit file -> environment. Configuration is loaded
//! from `~/.config/trustnet/config.toml` and/or `.trustnet/config.toml` in the
//! workspace directory.

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level TrustNet configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustNetConfig {
    /// HTTP boundary settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Embedding collaborator used by the semantic similarity signal.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Entity extraction collaborator used by the entity overlap signal.
    #[serde(default)]
    pub entities: EntityConfig,
    /// Trained classifier artifact.
    #[serde(default)]
    pub classifier: ClassifierConfig,
    /// Signal extraction limits.
    #[serde(default)]
    pub signals: SignalConfig,
    /// Which evaluation pipeline serves requests.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Configuration for embedding providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider name: "local" (default), "ollama", "openai".
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    /// Provider-specific model name.
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL override for remote providers.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Dimensionality of the local embedder.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Environment variable holding the API key for hosted providers.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            base_url: None,
            dimensions: default_dimensions(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_embedding_provider() -> String {
    "local".into()
}

fn default_dimensions() -> usize {
    256
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}

/// Configuration for entity extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Provider name: "pattern" (default) or "http".
    #[serde(default = "default_entity_provider")]
    pub provider: String,
    /// Endpoint for the "http" provider.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            provider: default_entity_provider(),
            endpoint: None,
        }
    }
}

fn default_entity_provider() -> String {
    "pattern".into()
}

/// Trained classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Path to the JSON model artifact. A missing file selects the fallback.
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
        }
    }
}

fn default_artifact_path() -> PathBuf {
    PathBuf::from("ml/artifacts/classifier.json")
}

/// Signal extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Timeout for each collaborator call in seconds (0 = no timeout).
    #[serde(default = "default_signal_timeout")]
    pub timeout_secs: u64,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_signal_timeout(),
        }
    }
}

fn default_signal_timeout() -> u64 {
    10
}

/// Evaluation pipeline selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Classifier-backed evaluation (canonical).
    #[default]
    Classifier,
    /// Temporary placeholder: mean of similarity and entity overlap.
    SignalMean,
}

impl std::fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classifier => f.write_str("classifier"),
            Self::SignalMean => f.write_str("signal_mean"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub mode: EvaluationMode,
}

impl TrustNetConfig {
    /// Check values that serde cannot validate on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::InvalidValue {
                field: "embedding.dimensions".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.entities.provider == "http" && self.entities.endpoint.is_none() {
            return Err(ConfigError::MissingField {
                field: "entities.endpoint".into(),
            });
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.max_body_bytes".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with `TRUSTNET_`, nested with `__`)
/// 2. Explicit config file (`--config`)
/// 3. Workspace-local config (`.trustnet/config.toml`)
/// 4. User config (`~/.config/trustnet/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<TrustNetConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(TrustNetConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("ai", "trustnet", "trustnet") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".trustnet").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = explicit {
        figment = figment.merge(Toml::file_exact(path));
    }

    // TRUSTNET_SERVER__PORT, TRUSTNET_CLASSIFIER__ARTIFACT_PATH, etc.
    figment = figment.merge(Env::prefixed("TRUSTNET_").split("__"));

    let config: TrustNetConfig = figment.extract().map_err(Box::new)?;
    config.validate()?;
    Ok(config)
}
