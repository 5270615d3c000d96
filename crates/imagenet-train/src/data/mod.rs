mod batcher;
mod folder;
mod split;

pub use batcher::*;
pub use folder::*;
pub use split::*;

use std::path::Path;
use std::sync::Arc;

use burn::config::Config;
use burn::data::dataloader::{DataLoader, DataLoaderBuilder};
use burn::data::dataset::Dataset;
use burn::tensor::backend::AutodiffBackend;

use crate::config::TrainingConfig;

/// Directory under the dataset root holding the images that are split into train and validation.
pub const TRAIN_DIR: &str = "train";
/// Directory under the dataset root used as the held-out test set.
pub const TEST_DIR: &str = "val";

#[derive(Config, Debug)]
pub struct DatasetConfig {
    /// Fraction of `train/` moved to the validation set.
    #[config(default = 0.1)]
    pub val_split: f64,
    /// Seed of the train/validation permutation and of the training shuffle.
    #[config(default = 42)]
    pub split_seed: u64,
    /// Side length images are resized to.
    #[config(default = 224)]
    pub image_size: usize,
}

/// The three partitions of an ImageNet-style folder.
pub struct DatasetSplits {
    pub train: DatasetSubset<ImageFolder>,
    pub valid: DatasetSubset<ImageFolder>,
    pub test: ImageFolder,
    pub classes: Vec<String>,
}

impl DatasetSplits {
    /// Indexes `root/train` and `root/val`, then splits `train` into train and validation.
    pub fn load(root: &Path, config: &DatasetConfig) -> crate::error::Result<Self> {
        let full_train = ImageFolder::new(root.join(TRAIN_DIR))?;
        let test = ImageFolder::new(root.join(TEST_DIR))?;

        let (train_indices, valid_indices) =
            split_indices(full_train.len(), config.val_split, config.split_seed)?;
        let classes = full_train.classes().to_vec();
        let full_train = Arc::new(full_train);

        Ok(Self {
            train: DatasetSubset::new(full_train.clone(), train_indices),
            valid: DatasetSubset::new(full_train, valid_indices),
            test,
            classes,
        })
    }
}

/// Dataloaders for every partition.
///
/// Only the training loader carries the autodiff backend; evaluation loaders
/// produce batches for the inner backend.
pub struct DataLoaders<B: AutodiffBackend> {
    pub train: Arc<dyn DataLoader<B, BatchResult<B>>>,
    pub valid: Arc<dyn DataLoader<B::InnerBackend, BatchResult<B::InnerBackend>>>,
    pub test: Arc<dyn DataLoader<B::InnerBackend, BatchResult<B::InnerBackend>>>,
}

impl<B: AutodiffBackend> DataLoaders<B> {
    pub fn new(splits: DatasetSplits, config: &TrainingConfig, device: &B::Device) -> Self {
        let batcher = ClassificationBatcher::new(config.dataset.image_size);
        let batch_size = config.batch_size;

        let train = DataLoaderBuilder::new(batcher.clone())
            .batch_size(batch_size)
            .shuffle(config.dataset.split_seed)
            .num_workers(config.num_workers)
            .set_device(device.clone())
            .build(splits.train);

        let valid = DataLoaderBuilder::new(batcher.clone())
            .batch_size(batch_size)
            .num_workers(config.num_workers)
            .set_device(device.clone())
            .build(splits.valid);

        // Not iterated by the training run; kept so the test partition is wired like the others.
        let test = DataLoaderBuilder::new(batcher)
            .batch_size(batch_size)
            .num_workers(config.num_workers)
            .set_device(device.clone())
            .build(splits.test);

        Self { train, valid, test }
    }
}

/// Number of batches a loader over `num_items` samples yields.
pub fn num_batches(num_items: usize, batch_size: usize) -> usize {
    num_items.div_ceil(batch_size.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn write_png(root: &Path, relative: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(3, 3, Rgb([1, 2, 3])).save(path).unwrap();
    }

    #[test]
    fn splits_partition_the_train_folder() {
        let dir = TempDir::new().unwrap();
        for i in 0..10 {
            write_png(dir.path(), &format!("train/a/{i}.png"));
            write_png(dir.path(), &format!("train/b/{i}.png"));
        }
        write_png(dir.path(), "val/a/0.png");
        write_png(dir.path(), "val/b/0.png");

        let splits = DatasetSplits::load(dir.path(), &DatasetConfig::new()).unwrap();

        assert_eq!(splits.classes, ["a", "b"]);
        assert_eq!(splits.train.len(), 18);
        assert_eq!(splits.valid.len(), 2);
        assert_eq!(splits.test.len(), 2);
    }

    #[test]
    fn loaders_yield_batches_for_every_partition() {
        type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;

        let dir = TempDir::new().unwrap();
        for i in 0..10 {
            write_png(dir.path(), &format!("train/a/{i}.png"));
            write_png(dir.path(), &format!("train/b/{i}.png"));
        }
        write_png(dir.path(), "val/a/0.png");
        write_png(dir.path(), "val/b/0.png");
        let config = TrainingConfig::new(crate::model::ResNetConfig::new(2))
            .with_dataset(DatasetConfig::new().with_image_size(8))
            .with_batch_size(4);
        let splits = DatasetSplits::load(dir.path(), &config.dataset).unwrap();

        let loaders = DataLoaders::<TrainBackend>::new(splits, &config, &Default::default());

        let train: Vec<_> = loaders.train.iter().map(|batch| batch.unwrap().len()).collect();
        assert_eq!(train.iter().sum::<usize>(), 18);
        assert_eq!(train.len(), num_batches(18, 4));
        assert_eq!(loaders.valid.iter().count(), 1);
        assert_eq!(loaders.test.num_items(), 2);
    }

    #[test]
    fn missing_val_folder_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_png(dir.path(), "train/a/0.png");

        assert!(DatasetSplits::load(dir.path(), &DatasetConfig::new()).is_err());
    }

    #[test]
    fn batch_count_rounds_up() {
        assert_eq!(num_batches(0, 4), 0);
        assert_eq!(num_batches(8, 4), 2);
        assert_eq!(num_batches(9, 4), 3);
        assert_eq!(num_batches(9, 0), 9);
    }
}
