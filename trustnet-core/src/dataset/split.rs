//! Shuffled train/validation/test split.

use super::{Sample, write_jsonl};
use crate::error::TrustNetError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::path::Path;

const TRAIN_PERCENT: usize = 70;
const VAL_PERCENT: usize = 15;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSplit {
    pub train: Vec<Sample>,
    pub val: Vec<Sample>,
    pub test: Vec<Sample>,
}

impl DatasetSplit {
    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shuffle with `seed`, then take 70% train, 15% validation and the rest as
/// test. Sizes are floored, so rounding remainders land in test.
pub fn split_dataset(mut samples: Vec<Sample>, seed: u64) -> DatasetSplit {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let n = samples.len();
    let train_end = n * TRAIN_PERCENT / 100;
    let val_end = train_end + n * VAL_PERCENT / 100;

    let test = samples.split_off(val_end);
    let val = samples.split_off(train_end);
    DatasetSplit {
        train: samples,
        val,
        test,
    }
}

/// Write `train.jsonl`, `val.jsonl` and `test.jsonl` into `dir`.
pub fn write_splits(dir: &Path, split: &DatasetSplit) -> Result<(), TrustNetError> {
    for (name, rows) in [
        ("train.jsonl", &split.train),
        ("val.jsonl", &split.val),
        ("test.jsonl", &split.test),
    ] {
        write_jsonl(&dir.join(name), rows)?;
    }
    tracing::info!(
        dir = %dir.display(),
        train = split.train.len(),
        val = split.val.len(),
        test = split.test.len(),
        "Wrote dataset splits"
    );
    Ok(())
}
