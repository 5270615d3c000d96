use std::num::NonZeroUsize;

use burn::config::Config;

use crate::data::DatasetConfig;
use crate::model::ResNetConfig;

/// Hyperparameters and loader settings for a training run.
#[derive(Config, Debug)]
pub struct TrainingConfig {
    pub model: ResNetConfig,
    #[config(default = "DatasetConfig::new()")]
    pub dataset: DatasetConfig,
    #[config(default = 10)]
    pub epochs: usize,
    #[config(default = 5e-4)]
    pub learning_rate: f64,
    #[config(default = 1e-4)]
    pub weight_decay: f64,
    #[config(default = 128)]
    pub batch_size: usize,
    /// Number of batches pulled by the throughput probe.
    #[config(default = 30)]
    pub test_batches: usize,
    #[config(default = 1)]
    pub num_workers: usize,
}

/// Number of dataloader workers when none was requested: every CPU this process may run on.
pub fn available_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_hyperparameters() {
        let config = TrainingConfig::new(ResNetConfig::resnet50(1000));

        assert_eq!(config.epochs, 10);
        assert_eq!(config.learning_rate, 5e-4);
        assert_eq!(config.weight_decay, 1e-4);
        assert_eq!(config.batch_size, 128);
        assert_eq!(config.test_batches, 30);
        assert_eq!(config.dataset.val_split, 0.1);
        assert_eq!(config.dataset.split_seed, 42);
        assert_eq!(config.dataset.image_size, 224);
        assert_eq!(config.model.num_classes, 1000);
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = TrainingConfig::new(ResNetConfig::resnet50(10))
            .with_epochs(2)
            .with_batch_size(4)
            .with_num_workers(3);

        assert_eq!(config.epochs, 2);
        assert_eq!(config.batch_size, 4);
        assert_eq!(config.num_workers, 3);
    }

    #[test]
    fn available_workers_is_never_zero() {
        assert!(available_workers() >= 1);
    }
}
