//! Model evaluation and feature ablation over extracted features.

use super::LabeledFeatures;
use super::metrics::{ClassificationReport, classification_report};
use crate::classifier::Classifier;
use crate::features::{FEATURE_COUNT, FEATURE_NAMES};
use crate::types::{Label, round4};
use serde::{Deserialize, Serialize};

/// Score a classifier against labeled features.
pub fn evaluate_classifier(
    classifier: &dyn Classifier,
    rows: &[LabeledFeatures],
) -> ClassificationReport {
    let gold: Vec<Label> = rows.iter().map(|r| r.label).collect();
    let predictions: Vec<_> = rows.iter().map(|r| classifier.predict(&r.features)).collect();
    let predicted: Vec<Label> = predictions.iter().map(|p| p.label).collect();
    let probabilities: Vec<_> = predictions.iter().map(|p| p.probabilities).collect();
    classification_report(&gold, &predicted, Some(&probabilities[..]))
}

/// Accuracy with one feature column zeroed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AblationEntry {
    pub feature: String,
    pub accuracy: f64,
    /// Base accuracy minus ablated accuracy.
    pub drop: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AblationReport {
    pub base_accuracy: f64,
    pub entries: Vec<AblationEntry>,
}

/// Zero each feature column in turn and measure the accuracy lost.
pub fn ablation(classifier: &dyn Classifier, rows: &[LabeledFeatures]) -> AblationReport {
    let base_accuracy = accuracy(classifier, rows, None);
    let entries = (0..FEATURE_COUNT)
        .map(|column| {
            let acc = accuracy(classifier, rows, Some(column));
            AblationEntry {
                feature: FEATURE_NAMES[column].to_string(),
                accuracy: round4(acc),
                drop: round4(base_accuracy - acc),
            }
        })
        .collect();
    AblationReport {
        base_accuracy: round4(base_accuracy),
        entries,
    }
}

fn accuracy(classifier: &dyn Classifier, rows: &[LabeledFeatures], zeroed: Option<usize>) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let correct = rows
        .iter()
        .filter(|row| {
            let features = match zeroed {
                Some(column) => row.features.with(column, 0.0),
                None => row.features,
            };
            classifier.predict(&features).label == row.label
        })
        .count();
    correct as f64 / rows.len() as f64
}
