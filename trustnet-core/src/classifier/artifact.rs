//! On-disk classifier artifact and its load-time validation.
//!
//! An artifact declares the feature columns and class names it was trained
//! with. Both are checked against this build before any prediction is made:
//! feature names must match column-for-column, and the class list must be a
//! permutation of the label map. A permutation is remapped rather than
//! trusted positionally.

use crate::error::ArtifactError;
use crate::features::{FEATURE_COUNT, FEATURE_NAMES};
use crate::types::Label;
use serde::{Deserialize, Serialize};

/// Artifact format version understood by this build.
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// A serialized, pre-fitted classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub classes: Vec<String>,
    pub model: ModelSpec,
}

/// Model parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Multinomial logistic regression: softmax(W·x + b).
    Logistic {
        /// One row of feature weights per class, in artifact class order.
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
    /// Multi-class gradient-boosted trees with softmax output.
    TreeEnsemble {
        /// Initial margin added to every class.
        #[serde(default)]
        base_score: f64,
        /// Boosting rounds; each round holds one tree per class.
        trees: Vec<Vec<Vec<TreeNode>>>,
    },
}

/// A node of a regression tree. Node 0 is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go to `left` when `x[feature] < threshold`, else `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { leaf: f64 },
}

impl ModelSpec {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Logistic { .. } => "logistic",
            Self::TreeEnsemble { .. } => "tree_ensemble",
        }
    }
}

impl ModelArtifact {
    /// Check compatibility and return, for each label (in label-map order),
    /// the artifact column holding its score.
    pub fn validate(&self) -> Result<[usize; 3], ArtifactError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::UnsupportedVersion {
                found: self.format_version,
                supported: ARTIFACT_FORMAT_VERSION,
            });
        }

        if self.feature_names.len() != FEATURE_COUNT
            || self
                .feature_names
                .iter()
                .zip(FEATURE_NAMES)
                .any(|(found, expected)| found != expected)
        {
            return Err(ArtifactError::FeatureMismatch {
                expected: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
                found: self.feature_names.clone(),
            });
        }

        let columns = self.label_columns()?;
        self.validate_model()?;
        Ok(columns)
    }

    fn label_columns(&self) -> Result<[usize; 3], ArtifactError> {
        let mismatch = || ArtifactError::LabelMapMismatch {
            found: self.classes.clone(),
        };
        if self.classes.len() != Label::ALL.len() {
            return Err(mismatch());
        }

        let mut columns: [Option<usize>; 3] = [None; 3];
        for (column, name) in self.classes.iter().enumerate() {
            let label: Label = name.parse().map_err(|_| mismatch())?;
            let slot = &mut columns[label.index()];
            if slot.is_some() {
                return Err(mismatch());
            }
            *slot = Some(column);
        }

        let mut resolved = [0usize; 3];
        for (idx, column) in columns.iter().enumerate() {
            resolved[idx] = column.ok_or_else(mismatch)?;
        }
        Ok(resolved)
    }

    fn validate_model(&self) -> Result<(), ArtifactError> {
        let n_classes = self.classes.len();
        match &self.model {
            ModelSpec::Logistic {
                coefficients,
                intercepts,
            } => {
                if coefficients.len() != n_classes || intercepts.len() != n_classes {
                    return Err(ArtifactError::Shape(format!(
                        "expected {n_classes} coefficient rows and intercepts, got {} and {}",
                        coefficients.len(),
                        intercepts.len()
                    )));
                }
                if let Some(row) = coefficients.iter().find(|r| r.len() != FEATURE_COUNT) {
                    return Err(ArtifactError::Shape(format!(
                        "coefficient row has {} weights, expected {FEATURE_COUNT}",
                        row.len()
                    )));
                }
                if coefficients
                    .iter()
                    .flatten()
                    .chain(intercepts)
                    .any(|v| !v.is_finite())
                {
                    return Err(ArtifactError::Shape("non-finite parameter".into()));
                }
                // Features lie in [0, 1], so |b| + sum(|w|) bounds each margin.
                if coefficients
                    .iter()
                    .zip(intercepts)
                    .any(|(row, b)| !row.iter().fold(b.abs(), |acc, w| acc + w.abs()).is_finite())
                {
                    return Err(ArtifactError::Shape("margins overflow".into()));
                }
            }
            ModelSpec::TreeEnsemble { base_score, trees } => {
                if !base_score.is_finite() {
                    return Err(ArtifactError::Shape("non-finite base_score".into()));
                }
                if trees.is_empty() {
                    return Err(ArtifactError::Shape("tree ensemble has no rounds".into()));
                }
                for (round, per_class) in trees.iter().enumerate() {
                    if per_class.len() != n_classes {
                        return Err(ArtifactError::Shape(format!(
                            "round {round} has {} trees, expected {n_classes}",
                            per_class.len()
                        )));
                    }
                    for tree in per_class {
                        validate_tree(tree)
                            .map_err(|msg| ArtifactError::Shape(format!("round {round}: {msg}")))?;
                    }
                }
                for class in 0..n_classes {
                    let bound = trees.iter().fold(base_score.abs(), |acc, per_class| {
                        acc + max_abs_leaf(&per_class[class])
                    });
                    if !bound.is_finite() {
                        return Err(ArtifactError::Shape("margins overflow".into()));
                    }
                }
            }
        }
        Ok(())
    }
}

fn max_abs_leaf(nodes: &[TreeNode]) -> f64 {
    nodes
        .iter()
        .filter_map(|node| match node {
            TreeNode::Leaf { leaf } => Some(leaf.abs()),
            TreeNode::Split { .. } => None,
        })
        .fold(0.0, f64::max)
}

/// Children must come after their parent, which rules out cycles.
fn validate_tree(nodes: &[TreeNode]) -> Result<(), String> {
    if nodes.is_empty() {
        return Err("empty tree".into());
    }
    for (idx, node) in nodes.iter().enumerate() {
        match node {
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if *feature >= FEATURE_COUNT {
                    return Err(format!("node {idx} splits on unknown feature {feature}"));
                }
                if !threshold.is_finite() {
                    return Err(format!("node {idx} has a non-finite threshold"));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= nodes.len() {
                        return Err(format!("node {idx} has invalid child {child}"));
                    }
                }
            }
            TreeNode::Leaf { leaf } => {
                if !leaf.is_finite() {
                    return Err(format!("node {idx} has a non-finite leaf"));
                }
            }
        }
    }
    Ok(())
}
