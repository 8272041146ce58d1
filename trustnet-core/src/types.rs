//! Core value types shared across the pipeline and the API boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Groundedness label. The discriminant is the class index used by every
/// classifier and artifact (the label map).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Grounded = 0,
    PartiallyGrounded = 1,
    Hallucinated = 2,
}

impl Label {
    /// All labels in class-index order.
    pub const ALL: [Label; 3] = [
        Label::Grounded,
        Label::PartiallyGrounded,
        Label::Hallucinated,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grounded => "grounded",
            Self::PartiallyGrounded => "partially_grounded",
            Self::Hallucinated => "hallucinated",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grounded" => Ok(Self::Grounded),
            "partially_grounded" => Ok(Self::PartiallyGrounded),
            "hallucinated" => Ok(Self::Hallucinated),
            other => Err(format!("unknown label '{other}'")),
        }
    }
}

/// Display action derived from a trust score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Show,
    ShowWithWarning,
    Flag,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Show => "show",
            Self::ShowWithWarning => "show_with_warning",
            Self::Flag => "flag",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named view of the four signal values, as exposed at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    pub semantic_similarity: f64,
    pub entity_overlap: f64,
    pub self_consistency: f64,
    pub entropy: f64,
}

/// Class probabilities in label-map order.
pub type ClassProbabilities = [f64; 3];

/// Output of a classifier for a single feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    /// Probability mass assigned to [`Label::Grounded`].
    pub trust_score: f64,
    pub probabilities: ClassProbabilities,
}

impl Prediction {
    /// Build a prediction from probabilities, selecting the highest class.
    /// Ties go to the lowest class index.
    pub fn from_probabilities(probabilities: ClassProbabilities) -> Self {
        let mut best = 0;
        for (idx, p) in probabilities.iter().enumerate().skip(1) {
            if *p > probabilities[best] {
                best = idx;
            }
        }
        Self {
            label: Label::ALL[best],
            trust_score: probabilities[Label::Grounded.index()],
            probabilities,
        }
    }
}

/// Full result of evaluating one (question, context, answer) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub label: Label,
    pub trust_score: f64,
    pub decision: Decision,
    pub signals: SignalScores,
}

/// Round to four decimal places, the precision of every reported score.
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_label_map_is_a_bijection() {
        for (idx, label) in Label::ALL.iter().enumerate() {
            assert_eq!(label.index(), idx);
            assert_eq!(Label::from_index(idx), Some(*label));
            assert_eq!(label.as_str().parse::<Label>().unwrap(), *label);
        }
        assert_eq!(Label::from_index(3), None);
    }

    #[test]
    fn test_label_serde_names() {
        let json = serde_json::to_string(&Label::PartiallyGrounded).unwrap();
        assert_eq!(json, "\"partially_grounded\"");
        let label: Label = serde_json::from_str("\"hallucinated\"").unwrap();
        assert_eq!(label, Label::Hallucinated);
    }

    #[test]
    fn test_unknown_label_rejected() {
        assert!("supported".parse::<Label>().is_err());
    }

    #[test]
    fn test_decision_serde_names() {
        assert_eq!(
            serde_json::to_string(&Decision::ShowWithWarning).unwrap(),
            "\"show_with_warning\""
        );
        assert_eq!(Decision::Flag.to_string(), "flag");
    }

    #[test]
    fn test_signal_scores_keys() {
        let scores = SignalScores {
            semantic_similarity: 0.9,
            entity_overlap: 1.0,
            self_consistency: 0.0,
            entropy: 0.0,
        };
        let value = serde_json::to_value(scores).unwrap();
        let mut keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "entity_overlap",
                "entropy",
                "self_consistency",
                "semantic_similarity"
            ]
        );
    }

    #[test]
    fn test_prediction_argmax() {
        let p = Prediction::from_probabilities([0.1, 0.2, 0.7]);
        assert_eq!(p.label, Label::Hallucinated);
        assert_eq!(p.trust_score, 0.1);
    }

    #[test]
    fn test_prediction_ties_go_to_lowest_index() {
        let p = Prediction::from_probabilities([0.4, 0.4, 0.2]);
        assert_eq!(p.label, Label::Grounded);

        let p = Prediction::from_probabilities([0.2, 0.4, 0.4]);
        assert_eq!(p.label, Label::PartiallyGrounded);
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(0.123456), 0.1235);
        assert_eq!(round4(1.0), 1.0);
        assert_eq!(round4(0.0), 0.0);
    }
}
