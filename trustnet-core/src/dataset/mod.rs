//! Offline evaluation over labeled datasets.
//!
//! Datasets are JSONL files of `{question, context, answer, label}` records.
//! Features are extracted once with the same [`FeatureBuilder`] the online
//! path uses, then scored by any [`Classifier`](crate::classifier::Classifier)
//! or baseline.

mod analysis;
mod baselines;
mod metrics;
mod split;

pub use analysis::{AblationEntry, AblationReport, ablation, evaluate_classifier};
pub use baselines::{random_baseline, similarity_only_baseline, similarity_only_label};
pub use metrics::{ClassificationReport, classification_report, roc_auc_ovr};
pub use split::{DatasetSplit, split_dataset, write_splits};

use crate::error::{DatasetError, TrustNetError};
use crate::features::{FeatureBuilder, FeatureVector};
use crate::types::Label;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::io::Write;
use std::path::Path;

/// One labeled example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub question: String,
    pub context: String,
    pub answer: String,
    pub label: Label,
}

/// Extracted features paired with the gold label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledFeatures {
    pub features: FeatureVector,
    pub label: Label,
}

/// Read a JSONL file, skipping blank lines.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, DatasetError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str(line).map_err(|e| DatasetError::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Write records as JSONL, creating parent directories as needed.
pub fn write_jsonl<T: Serialize>(path: &Path, records: &[T]) -> Result<(), TrustNetError> {
    let write_err = |source| DatasetError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let file = std::fs::File::create(path).map_err(write_err)?;
    let mut out = std::io::BufWriter::new(file);
    for record in records {
        serde_json::to_writer(&mut out, record)?;
        out.write_all(b"\n").map_err(write_err)?;
    }
    out.flush().map_err(write_err)?;
    Ok(())
}

/// Load a labeled dataset. Empty datasets are rejected.
pub fn load_dataset(path: &Path) -> Result<Vec<Sample>, DatasetError> {
    let samples: Vec<Sample> = read_jsonl(path)?;
    if samples.is_empty() {
        return Err(DatasetError::Empty);
    }
    tracing::debug!(path = %path.display(), samples = samples.len(), "Loaded dataset");
    Ok(samples)
}

/// Run the feature builder over every sample, in order.
pub async fn extract_features(
    builder: &FeatureBuilder,
    samples: &[Sample],
) -> Result<Vec<LabeledFeatures>, TrustNetError> {
    let mut rows = Vec::with_capacity(samples.len());
    for (idx, sample) in samples.iter().enumerate() {
        let features = builder
            .build(&sample.question, &sample.context, &sample.answer)
            .await?;
        rows.push(LabeledFeatures {
            features,
            label: sample.label,
        });
        if (idx + 1) % 100 == 0 {
            tracing::info!(done = idx + 1, total = samples.len(), "Extracting features");
        }
    }
    Ok(rows)
}
