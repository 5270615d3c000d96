use std::path::PathBuf;

use clap::builder::RangedU64ValueParser;
use clap::{Args, Parser};
use imagenet_train::TrainingConfig;
use imagenet_train::config::available_workers;
use imagenet_train::data::DatasetConfig;
use imagenet_train::model::ResNetConfig;

/// Folder under `--data-dir` that holds the `train/` and `val/` splits.
pub const DATASET_DIR: &str = "imagenet";

#[derive(Args, Debug)]
pub struct DataArgs {
    /// Directory containing the `imagenet/` dataset folder.
    #[arg(long, env = "SLURM_TMPDIR", default_value = ".")]
    pub data_dir: PathBuf,
    /// Dataloader workers; defaults to the CPUs available to this process.
    #[arg(long, env = "SLURM_CPUS_PER_TASK")]
    pub num_workers: Option<usize>,
    /// Fraction of `train/` held out for validation.
    #[arg(long, default_value_t = 0.1)]
    pub val_split: f64,
    #[arg(long, default_value_t = 42)]
    pub split_seed: u64,
    /// Side length images are resized to.
    #[arg(long, default_value_t = 224)]
    pub image_size: usize,
}

#[derive(Parser, Debug)]
#[command(
    name = "imagenet-train",
    version,
    about = "Single-GPU ResNet-50 training on ImageNet, with a dataloader throughput check"
)]
pub struct TrainArgs {
    #[arg(long, default_value_t = 10)]
    pub epochs: usize,
    #[arg(long, default_value_t = 5e-4)]
    pub learning_rate: f64,
    #[arg(long, default_value_t = 1e-4)]
    pub weight_decay: f64,
    #[arg(long, default_value_t = 128, value_parser = at_least_one())]
    pub batch_size: usize,
    /// Batches pulled by the dataloader throughput check.
    #[arg(long, default_value_t = 30)]
    pub test_batches: usize,
    #[arg(long, default_value_t = 1000)]
    pub num_classes: usize,
    #[command(flatten)]
    pub data: DataArgs,
}

impl TrainArgs {
    pub fn dataset_root(&self) -> PathBuf {
        self.data.data_dir.join(DATASET_DIR)
    }

    pub fn training_config(&self) -> TrainingConfig {
        let dataset = DatasetConfig::new()
            .with_val_split(self.data.val_split)
            .with_split_seed(self.data.split_seed)
            .with_image_size(self.data.image_size);

        TrainingConfig::new(ResNetConfig::resnet50(self.num_classes))
            .with_dataset(dataset)
            .with_epochs(self.epochs)
            .with_learning_rate(self.learning_rate)
            .with_weight_decay(self.weight_decay)
            .with_batch_size(self.batch_size)
            .with_test_batches(self.test_batches)
            .with_num_workers(self.data.num_workers.unwrap_or_else(available_workers))
    }
}

fn at_least_one() -> RangedU64ValueParser<usize> {
    RangedU64ValueParser::new().range(1..)
}

pub fn parse_train_args() -> TrainArgs {
    TrainArgs::parse()
}
