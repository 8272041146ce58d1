//! Signal functions: each maps an (answer, context) pair to a score in [0, 1].
//!
//! The scoring math is kept in pure functions ([`normalized_cosine`],
//! [`overlap_ratio`]) so it can be tested without any collaborator; the async
//! wrappers add the collaborator call and an optional timeout.

use crate::embeddings::Embedder;
use crate::entities::EntityExtractor;
use crate::error::SignalError;
use crate::types::round4;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

/// Reserved self-consistency signal. Always 0.0 until implemented.
pub const SELF_CONSISTENCY_PLACEHOLDER: f64 = 0.0;

/// Reserved entropy signal. Always 0.0 until implemented.
pub const ENTROPY_PLACEHOLDER: f64 = 0.0;

/// Cosine similarity of two vectors in [-1, 1].
///
/// Returns 0.0 when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Remap a cosine in [-1, 1] to [0, 1] and round to four decimals.
pub fn normalized_cosine(a: &[f32], b: &[f32]) -> f64 {
    round4((cosine_similarity(a, b) + 1.0) / 2.0)
}

/// Fraction of answer entities that also appear in the context.
///
/// An answer with no entities cannot contradict the context on entities, so
/// it scores 1.0.
pub fn overlap_ratio(answer: &HashSet<String>, context: &HashSet<String>) -> f64 {
    if answer.is_empty() {
        return 1.0;
    }
    let shared = answer.intersection(context).count();
    round4(shared as f64 / answer.len() as f64)
}

/// Semantic similarity between answer and context embeddings.
pub async fn semantic_similarity(
    embedder: &dyn Embedder,
    answer: &str,
    context: &str,
    timeout: Option<Duration>,
) -> Result<f64, SignalError> {
    let vectors = with_timeout(
        "embedding service",
        timeout,
        embedder.encode(&[answer, context]),
    )
    .await?;

    let [a, c] = vectors.as_slice() else {
        return Err(SignalError::embedding(format!(
            "expected 2 embeddings, got {}",
            vectors.len()
        )));
    };
    if a.is_empty() || a.len() != c.len() {
        return Err(SignalError::embedding(format!(
            "embedding dimensions differ or are empty ({} vs {})",
            a.len(),
            c.len()
        )));
    }
    if a.iter().chain(c).any(|v| !v.is_finite()) {
        return Err(SignalError::embedding("embedding contains non-finite values"));
    }

    Ok(normalized_cosine(a, c))
}

/// Entity overlap between answer and context.
pub async fn entity_overlap(
    extractor: &dyn EntityExtractor,
    answer: &str,
    context: &str,
    timeout: Option<Duration>,
) -> Result<f64, SignalError> {
    let answer_entities =
        with_timeout("entity extractor", timeout, extractor.extract(answer)).await?;
    let context_entities =
        with_timeout("entity extractor", timeout, extractor.extract(context)).await?;
    Ok(overlap_ratio(&answer_entities, &context_entities))
}

async fn with_timeout<T>(
    collaborator: &'static str,
    timeout: Option<Duration>,
    fut: impl Future<Output = Result<T, SignalError>>,
) -> Result<T, SignalError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| SignalError::Timeout {
                collaborator,
                timeout_secs: limit.as_secs(),
            })?,
        None => fut.await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::LocalEmbedder;
    use crate::entities::PatternEntityExtractor;
    use async_trait::async_trait;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    struct FixedEmbedder(Vec<Vec<f32>>);

    #[async_trait]
    impl Embedder for FixedEmbedder {
        async fn encode(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>, SignalError> {
            Ok(self.0.clone())
        }

        fn provider_name(&self) -> &str {
            "fixed"
        }
    }

    struct SlowEmbedder;

    #[async_trait]
    impl Embedder for SlowEmbedder {
        async fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, SignalError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(texts.iter().map(|_| vec![1.0]).collect())
        }

        fn provider_name(&self) -> &str {
            "slow"
        }
    }

    struct DownExtractor;

    #[async_trait]
    impl EntityExtractor for DownExtractor {
        async fn extract(&self, _text: &str) -> Result<HashSet<String>, SignalError> {
            Err(SignalError::entity_extraction("connection refused"))
        }

        fn provider_name(&self) -> &str {
            "down"
        }
    }

    /// Fails only on the context text.
    struct ContextDownExtractor;

    #[async_trait]
    impl EntityExtractor for ContextDownExtractor {
        async fn extract(&self, text: &str) -> Result<HashSet<String>, SignalError> {
            if text == "context" {
                return Err(SignalError::entity_extraction("connection refused"));
            }
            Ok(HashSet::new())
        }

        fn provider_name(&self) -> &str {
            "context-down"
        }
    }

    struct StalledExtractor;

    #[async_trait]
    impl EntityExtractor for StalledExtractor {
        async fn extract(&self, _text: &str) -> Result<HashSet<String>, SignalError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(HashSet::new())
        }

        fn provider_name(&self) -> &str {
            "stalled"
        }
    }

    #[test]
    fn test_cosine_bounds() {
        assert_eq!(normalized_cosine(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
        assert_eq!(normalized_cosine(&[1.0, 0.0], &[-1.0, 0.0]), 0.0);
        assert_eq!(normalized_cosine(&[1.0, 0.0], &[0.0, 1.0]), 0.5);
    }

    #[test]
    fn test_cosine_zero_vector() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(normalized_cosine(&[0.0, 0.0], &[1.0, 2.0]), 0.5);
    }

    #[test]
    fn test_cosine_rounds_to_four_decimals() {
        let score = normalized_cosine(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]);
        assert_eq!(score, round4(score));
        // cos = 10/14
        assert_eq!(score, 0.8571);
    }

    #[test]
    fn test_overlap_scenarios() {
        assert_eq!(overlap_ratio(&set(&["paris"]), &set(&["france", "paris"])), 1.0);
        assert_eq!(overlap_ratio(&set(&["berlin"]), &set(&["france", "paris"])), 0.0);
        assert_eq!(overlap_ratio(&set(&[]), &set(&["france"])), 1.0);
        assert_eq!(overlap_ratio(&set(&[]), &set(&[])), 1.0);
        assert_eq!(overlap_ratio(&set(&["paris"]), &set(&[])), 0.0);
        assert_eq!(
            overlap_ratio(&set(&["paris", "berlin", "rome"]), &set(&["paris"])),
            0.3333
        );
    }

    #[tokio::test]
    async fn test_semantic_similarity_identical_texts() {
        let embedder = LocalEmbedder::new(128);
        let score = semantic_similarity(&embedder, "Paris is the capital", "Paris is the capital", None)
            .await
            .unwrap();
        assert_eq!(score, 1.0);
    }

    #[tokio::test]
    async fn test_semantic_similarity_malformed_count() {
        let embedder = FixedEmbedder(vec![vec![1.0, 0.0]]);
        let err = semantic_similarity(&embedder, "a", "b", None).await.unwrap_err();
        assert!(matches!(err, SignalError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_semantic_similarity_mismatched_dimensions() {
        let embedder = FixedEmbedder(vec![vec![1.0, 0.0], vec![1.0]]);
        assert!(semantic_similarity(&embedder, "a", "b", None).await.is_err());

        let embedder = FixedEmbedder(vec![vec![], vec![]]);
        assert!(semantic_similarity(&embedder, "a", "b", None).await.is_err());
    }

    #[tokio::test]
    async fn test_semantic_similarity_non_finite() {
        let embedder = FixedEmbedder(vec![vec![f32::NAN, 0.0], vec![1.0, 0.0]]);
        assert!(semantic_similarity(&embedder, "a", "b", None).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_semantic_similarity_timeout() {
        let err = semantic_similarity(&SlowEmbedder, "a", "b", Some(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_entity_overlap_with_pattern_extractor() {
        let extractor = PatternEntityExtractor::new();
        let context = "The capital of France is Paris.";
        assert_eq!(
            entity_overlap(&extractor, "Paris", context, None).await.unwrap(),
            1.0
        );
        assert_eq!(
            entity_overlap(&extractor, "Berlin", context, None).await.unwrap(),
            0.0
        );
        assert_eq!(
            entity_overlap(&extractor, "it is lovely", context, None)
                .await
                .unwrap(),
            1.0
        );
    }

    #[tokio::test]
    async fn test_entity_overlap_ignores_sentence_openers() {
        let extractor = PatternEntityExtractor::new();
        let context = "The capital of France is Paris.";
        for answer in ["Is Paris the capital?", "Actually, Paris."] {
            assert_eq!(
                entity_overlap(&extractor, answer, context, None)
                    .await
                    .unwrap(),
                1.0,
                "{answer}"
            );
        }
    }

    #[tokio::test]
    async fn test_entity_overlap_checks_context_even_without_answer_entities() {
        let err = entity_overlap(&ContextDownExtractor, "it is lovely", "context", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SignalError::EntityExtraction(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entity_overlap_timeout() {
        let err = entity_overlap(&StalledExtractor, "a", "b", Some(Duration::from_secs(1)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SignalError::Timeout {
                collaborator: "entity extractor",
                timeout_secs: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_entity_overlap_propagates_failure() {
        let err = entity_overlap(&DownExtractor, "Paris", "France", None)
            .await
            .unwrap_err();
        assert!(matches!(err, SignalError::EntityExtraction(_)));
    }
}
