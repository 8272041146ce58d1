//! Classification metrics for three-class groundedness predictions.

use crate::types::{ClassProbabilities, Label, round4};
use serde::{Deserialize, Serialize};

/// Summary of predictions against gold labels.
///
/// Precision, recall and F1 are macro-averaged over the classes that occur
/// in either the gold labels or the predictions. ROC AUC is the macro
/// one-vs-rest average over classes with both positive and negative
/// examples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub samples: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roc_auc: Option<f64>,
    /// `confusion_matrix[gold][predicted]`, in label-map order.
    pub confusion_matrix: [[usize; 3]; 3],
    /// Gold examples per class.
    pub support: [usize; 3],
}

/// Compute a report. `probabilities`, when given, enables ROC AUC.
///
/// # Panics
///
/// Panics if the slices differ in length.
pub fn classification_report(
    gold: &[Label],
    predicted: &[Label],
    probabilities: Option<&[ClassProbabilities]>,
) -> ClassificationReport {
    assert_eq!(gold.len(), predicted.len(), "gold/predicted length mismatch");

    let mut confusion = [[0usize; 3]; 3];
    for (g, p) in gold.iter().zip(predicted) {
        confusion[g.index()][p.index()] += 1;
    }

    let n = gold.len();
    let correct: usize = (0..3).map(|i| confusion[i][i]).sum();
    let accuracy = if n == 0 { 0.0 } else { correct as f64 / n as f64 };

    let mut support = [0usize; 3];
    let mut predicted_counts = [0usize; 3];
    for i in 0..3 {
        for j in 0..3 {
            support[i] += confusion[i][j];
            predicted_counts[j] += confusion[i][j];
        }
    }

    let (mut precision, mut recall, mut f1, mut classes) = (0.0, 0.0, 0.0, 0usize);
    for i in 0..3 {
        if support[i] == 0 && predicted_counts[i] == 0 {
            continue;
        }
        let tp = confusion[i][i] as f64;
        let p = ratio(tp, predicted_counts[i] as f64);
        let r = ratio(tp, support[i] as f64);
        let f = ratio(2.0 * p * r, p + r);
        precision += p;
        recall += r;
        f1 += f;
        classes += 1;
    }
    let classes = classes.max(1) as f64;

    let roc_auc = probabilities.and_then(|probs| roc_auc_ovr(gold, probs));

    ClassificationReport {
        samples: n,
        accuracy: round4(accuracy),
        precision: round4(precision / classes),
        recall: round4(recall / classes),
        f1: round4(f1 / classes),
        roc_auc: roc_auc.map(round4),
        confusion_matrix: confusion,
        support,
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

/// Macro one-vs-rest ROC AUC. Classes lacking positives or negatives are
/// skipped; returns `None` if no class qualifies.
pub fn roc_auc_ovr(gold: &[Label], probabilities: &[ClassProbabilities]) -> Option<f64> {
    assert_eq!(gold.len(), probabilities.len(), "gold/probability length mismatch");

    let mut total = 0.0;
    let mut classes = 0usize;
    for label in Label::ALL {
        let positives: Vec<bool> = gold.iter().map(|g| *g == label).collect();
        let scores: Vec<f64> = probabilities.iter().map(|p| p[label.index()]).collect();
        if let Some(auc) = binary_auc(&positives, &scores) {
            total += auc;
            classes += 1;
        }
    }
    (classes > 0).then(|| total / classes as f64)
}

/// Mann-Whitney AUC with tied scores sharing their average rank.
fn binary_auc(positives: &[bool], scores: &[f64]) -> Option<f64> {
    let n_pos = positives.iter().filter(|p| **p).count();
    let n_neg = positives.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|a, b| scores[*a].total_cmp(&scores[*b]));

    let mut ranks = vec![0.0; scores.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && scores[order[end + 1]] == scores[order[start]] {
            end += 1;
        }
        // 1-based ranks start+1..=end+1 share their mean
        let rank = (start + end) as f64 / 2.0 + 1.0;
        for idx in &order[start..=end] {
            ranks[*idx] = rank;
        }
        start = end + 1;
    }

    let pos_rank_sum: f64 = ranks
        .iter()
        .zip(positives)
        .filter(|(_, p)| **p)
        .map(|(r, _)| r)
        .sum();
    let n_pos = n_pos as f64;
    Some((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg as f64))
}
