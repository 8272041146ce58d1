//! Classifier backed by a validated model artifact.

use super::artifact::{ModelArtifact, ModelSpec, TreeNode};
use super::{Classifier, ClassifierKind};
use crate::error::ArtifactError;
use crate::features::FeatureVector;
use crate::types::ClassProbabilities;
use std::path::Path;

/// A pre-fitted model, loaded once and read-only afterwards.
#[derive(Debug, Clone)]
pub struct TrainedClassifier {
    model: ModelSpec,
    /// Artifact column for each label, in label-map order.
    label_columns: [usize; 3],
}

impl TrainedClassifier {
    /// Read and validate the artifact at `path`.
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: ModelArtifact = serde_json::from_str(&raw)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ArtifactError> {
        let label_columns = artifact.validate()?;
        Ok(Self {
            model: artifact.model,
            label_columns,
        })
    }

    pub fn model_type(&self) -> &'static str {
        self.model.type_name()
    }

    /// Raw per-class margins, in artifact column order.
    fn margins(&self, x: &[f64; 4]) -> [f64; 3] {
        let mut margins = [0.0; 3];
        match &self.model {
            ModelSpec::Logistic {
                coefficients,
                intercepts,
            } => {
                for (class, margin) in margins.iter_mut().enumerate() {
                    *margin = intercepts[class]
                        + coefficients[class]
                            .iter()
                            .zip(x)
                            .map(|(w, v)| w * v)
                            .sum::<f64>();
                }
            }
            ModelSpec::TreeEnsemble { base_score, trees } => {
                margins = [*base_score; 3];
                for round in trees {
                    for (class, tree) in round.iter().enumerate() {
                        margins[class] += score_tree(tree, x);
                    }
                }
            }
        }
        margins
    }
}

fn score_tree(nodes: &[TreeNode], x: &[f64; 4]) -> f64 {
    let mut idx = 0;
    loop {
        match &nodes[idx] {
            TreeNode::Leaf { leaf } => return *leaf,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                idx = if x[*feature] < *threshold {
                    *left
                } else {
                    *right
                };
            }
        }
    }
}

fn softmax(margins: [f64; 3]) -> [f64; 3] {
    let max = margins.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp = margins.map(|m| (m - max).exp());
    let sum: f64 = exp.iter().sum();
    exp.map(|e| e / sum)
}

impl Classifier for TrainedClassifier {
    fn predict_proba(&self, features: &FeatureVector) -> ClassProbabilities {
        let by_column = softmax(self.margins(features.values()));
        self.label_columns.map(|column| by_column[column])
    }

    fn kind(&self) -> ClassifierKind {
        ClassifierKind::Trained
    }
}
