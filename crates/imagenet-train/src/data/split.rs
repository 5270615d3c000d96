use std::sync::Arc;

use burn::data::dataset::Dataset;
use derive_new::new;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{Result, TrainError};

/// A view over a shared dataset restricted to the given indices.
#[derive(new, Clone, Debug)]
pub struct DatasetSubset<D> {
    dataset: Arc<D>,
    indices: Vec<usize>,
}

impl<D> DatasetSubset<D> {
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

impl<D, I> Dataset<I> for DatasetSubset<D>
where
    D: Dataset<I>,
{
    fn get(&self, index: usize) -> Option<I> {
        let inner = *self.indices.get(index)?;
        self.dataset.get(inner)
    }

    fn len(&self) -> usize {
        self.indices.len()
    }
}

/// Partitions `0..len` into `(train, valid)` index sets.
///
/// The validation part holds `floor(val_split * len)` indices. Both parts come from
/// one permutation drawn with `seed`, so a given seed always yields the same split.
pub fn split_indices(len: usize, val_split: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(0.0..1.0).contains(&val_split) {
        return Err(TrainError::InvalidSplit(val_split));
    }

    let n_valid = (val_split * len as f64).floor() as usize;
    let n_train = len - n_valid;

    let mut train: Vec<usize> = (0..len).collect();
    train.shuffle(&mut StdRng::seed_from_u64(seed));
    let valid = train.split_off(n_train);

    Ok((train, valid))
}
