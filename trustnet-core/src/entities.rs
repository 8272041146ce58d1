//! Named-entity extraction collaborators for the entity overlap signal.
//!
//! Extractors return sets of lowercase entity strings. The built-in
//! [`PatternEntityExtractor`] recognizes capitalized spans and numerals; the
//! [`HttpEntityExtractor`] delegates to an external NER service.

use crate::config::EntityConfig;
use crate::error::{ConfigError, SignalError};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Trait for entity extraction providers.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Extract the set of lowercase entities mentioned in `text`.
    async fn extract(&self, text: &str) -> Result<HashSet<String>, SignalError>;

    /// Return the provider name.
    fn provider_name(&self) -> &str;
}

/// Runs of capitalized words, optionally joined by "of"/"de"/"von"/... as in
/// "Bank of England".
static CAPITALIZED_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b\p{Lu}[\p{L}\p{N}'’\-]*(?:\s+(?:(?:of|de|da|del|von|van|la|le)\s+)?\p{Lu}[\p{L}\p{N}'’\-]*)*",
    )
    .expect("valid regex")
});

static NUMERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\p{N}+(?:[.,]\p{N}+)*%?").expect("valid regex"));

/// Capitalized words that open sentences but are not entities: function
/// words, auxiliaries of question-form answers, and discourse markers.
const LEADING_STOPWORDS: &[&str] = &[
    "a", "according", "actually", "additionally", "after", "also", "although", "an", "and",
    "are", "as", "at", "based", "be", "because", "been", "before", "both", "but", "by", "can",
    "certainly", "could", "did", "do", "does", "each", "every", "finally", "for", "from",
    "furthermore", "had", "has", "have", "he", "her", "here", "his", "how", "however", "i", "if",
    "in", "indeed", "instead", "is", "it", "its", "just", "many", "moreover", "most", "my", "no",
    "not", "of", "on", "only", "or", "our", "overall", "she", "should", "since", "so",
    "some", "still", "sure", "that", "the", "their", "then", "there", "therefore", "these",
    "they", "this", "those", "though", "thus", "to", "unfortunately", "was", "we", "were",
    "what", "when", "where", "which", "while", "who", "why", "with", "would", "yes", "yet",
    "you", "your",
];

/// Rule-based extractor: capitalized spans and numerals.
#[derive(Debug, Clone, Default)]
pub struct PatternEntityExtractor;

impl PatternEntityExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Synchronous extraction, used by the async trait implementation.
    pub fn extract_sync(&self, text: &str) -> HashSet<String> {
        let mut entities = HashSet::new();

        for m in CAPITALIZED_SPAN.find_iter(text) {
            let span = m.as_str().trim_end_matches(['\'', '’', '-']);
            let mut words: Vec<&str> = span.split_whitespace().collect();
            while let Some(first) = words.first() {
                if LEADING_STOPWORDS.contains(&first.to_lowercase().as_str()) {
                    words.remove(0);
                } else {
                    break;
                }
            }
            // Bare joiners ("of", "de") cannot start an entity either.
            if words.is_empty() || !words[0].starts_with(char::is_uppercase) {
                continue;
            }
            entities.insert(words.join(" ").to_lowercase());
        }

        for m in NUMERAL.find_iter(text) {
            entities.insert(m.as_str().to_lowercase());
        }

        entities
    }
}

#[async_trait]
impl EntityExtractor for PatternEntityExtractor {
    async fn extract(&self, text: &str) -> Result<HashSet<String>, SignalError> {
        Ok(self.extract_sync(text))
    }

    fn provider_name(&self) -> &str {
        "pattern"
    }
}

/// Extractor backed by an external service:
/// `POST {endpoint} {"text": ...}` → `{"entities": ["...", ...]}`.
pub struct HttpEntityExtractor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEntityExtractor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EntityExtractor for HttpEntityExtractor {
    async fn extract(&self, text: &str) -> Result<HashSet<String>, SignalError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| {
                SignalError::entity_extraction(format!("request to {} failed: {e}", self.endpoint))
            })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(SignalError::entity_extraction(format!(
                "{} returned HTTP {status}",
                self.endpoint
            )));
        }
        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| SignalError::entity_extraction(format!("invalid JSON: {e}")))?;
        parse_entities(&json)
    }

    fn provider_name(&self) -> &str {
        "http"
    }
}

fn parse_entities(json: &serde_json::Value) -> Result<HashSet<String>, SignalError> {
    let items = json["entities"]
        .as_array()
        .ok_or_else(|| SignalError::entity_extraction("response has no 'entities' array"))?;
    items
        .iter()
        .map(|v| {
            v.as_str()
                .map(|s| s.trim().to_lowercase())
                .ok_or_else(|| SignalError::entity_extraction("entity is not a string"))
        })
        .filter(|r| !matches!(r, Ok(s) if s.is_empty()))
        .collect()
}

/// Factory function to create an entity extractor based on configuration.
pub fn create_entity_extractor(
    config: &EntityConfig,
) -> Result<Box<dyn EntityExtractor>, ConfigError> {
    match config.provider.as_str() {
        "pattern" => Ok(Box::new(PatternEntityExtractor::new())),
        "http" => {
            let endpoint = config
                .endpoint
                .clone()
                .ok_or_else(|| ConfigError::MissingField {
                    field: "entities.endpoint".into(),
                })?;
            Ok(Box::new(HttpEntityExtractor::new(endpoint)))
        }
        other => Err(ConfigError::InvalidValue {
            field: "entities.provider".into(),
            message: format!("unknown provider '{other}' (expected pattern or http)"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_capital_of_france() {
        let extractor = PatternEntityExtractor::new();
        assert_eq!(
            extractor.extract_sync("The capital of France is Paris."),
            set(&["france", "paris"])
        );
        assert_eq!(extractor.extract_sync("Paris"), set(&["paris"]));
        assert_eq!(extractor.extract_sync("Berlin"), set(&["berlin"]));
    }

    #[test]
    fn test_multi_word_entities() {
        let extractor = PatternEntityExtractor::new();
        let entities = extractor.extract_sync("She studied at the Bank of England with Ada Lovelace.");
        assert_eq!(entities, set(&["bank of england", "ada lovelace"]));
    }

    #[test]
    fn test_question_form_openings() {
        let extractor = PatternEntityExtractor::new();
        assert_eq!(extractor.extract_sync("Is Paris the capital?"), set(&["paris"]));
        assert_eq!(
            extractor.extract_sync("Does Marie Curie hold two Nobel prizes?"),
            set(&["marie curie", "nobel"])
        );
        assert_eq!(extractor.extract_sync("Was it built in 1889?"), set(&["1889"]));
    }

    #[test]
    fn test_discourse_marker_openings() {
        let extractor = PatternEntityExtractor::new();
        assert_eq!(extractor.extract_sync("Actually, Paris."), set(&["paris"]));
        assert_eq!(
            extractor.extract_sync("According to the context, Paris is the capital."),
            set(&["paris"])
        );
        assert_eq!(
            extractor.extract_sync("However, Berlin is larger. Also Rome."),
            set(&["berlin", "rome"])
        );
        assert!(extractor.extract_sync("Based on this, yes.").is_empty());
    }

    #[test]
    fn test_numerals() {
        let extractor = PatternEntityExtractor::new();
        let entities = extractor.extract_sync("It opened in 1889 and cost 7,799,000 francs, up 12%.");
        assert_eq!(entities, set(&["1889", "7,799,000", "12%"]));
    }

    #[test]
    fn test_no_entities() {
        let extractor = PatternEntityExtractor::new();
        assert!(extractor.extract_sync("it is a big city.").is_empty());
        assert!(extractor.extract_sync("The answer is yes.").is_empty());
        assert!(extractor.extract_sync("").is_empty());
    }

    #[tokio::test]
    async fn test_trait_object() {
        let extractor: Box<dyn EntityExtractor> = Box::new(PatternEntityExtractor::new());
        assert_eq!(extractor.provider_name(), "pattern");
        let entities = extractor.extract("Marie Curie won in 1903").await.unwrap();
        assert_eq!(entities, set(&["marie curie", "1903"]));
    }

    #[test]
    fn test_parse_entities_lowercases() {
        let json = serde_json::json!({"entities": ["Paris", " FRANCE ", ""]});
        assert_eq!(parse_entities(&json).unwrap(), set(&["paris", "france"]));
    }

    #[test]
    fn test_parse_entities_malformed() {
        assert!(parse_entities(&serde_json::json!({"ents": []})).is_err());
        assert!(parse_entities(&serde_json::json!({"entities": [1, 2]})).is_err());
    }

    #[test]
    fn test_create_entity_extractor() {
        let extractor = create_entity_extractor(&EntityConfig::default()).unwrap();
        assert_eq!(extractor.provider_name(), "pattern");

        let config = EntityConfig {
            provider: "http".into(),
            endpoint: None,
        };
        assert!(create_entity_extractor(&config).is_err());

        let config = EntityConfig {
            provider: "spacy".into(),
            endpoint: None,
        };
        assert!(create_entity_extractor(&config).is_err());
    }
}
