//! Reference baselines for comparing a trained classifier against.

use super::LabeledFeatures;
use super::metrics::{ClassificationReport, classification_report};
use crate::types::{Label, round4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SIMILARITY_GROUNDED: f64 = 0.75;
const SIMILARITY_PARTIAL: f64 = 0.4;

/// Accuracy of uniformly random labels, reproducible for a given seed.
pub fn random_baseline(gold: &[Label], seed: u64) -> f64 {
    if gold.is_empty() {
        return 0.0;
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let correct = gold
        .iter()
        .filter(|label| Label::ALL[rng.gen_range(0..Label::ALL.len())] == **label)
        .count();
    round4(correct as f64 / gold.len() as f64)
}

/// Threshold rule on semantic similarity alone.
pub fn similarity_only_label(similarity: f64) -> Label {
    if similarity > SIMILARITY_GROUNDED {
        Label::Grounded
    } else if similarity > SIMILARITY_PARTIAL {
        Label::PartiallyGrounded
    } else {
        Label::Hallucinated
    }
}

pub fn similarity_only_baseline(rows: &[LabeledFeatures]) -> ClassificationReport {
    let gold: Vec<Label> = rows.iter().map(|r| r.label).collect();
    let predicted: Vec<Label> = rows
        .iter()
        .map(|r| similarity_only_label(r.features.semantic_similarity()))
        .collect();
    classification_report(&gold, &predicted, None)
}
