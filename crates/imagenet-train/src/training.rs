use std::path::Path;

use burn::data::dataloader::DataLoader;
use burn::data::dataset::Dataset;
use burn::module::AutodiffModule;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::{AdamWConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::tensor::ElementConversion;
use burn::tensor::backend::AutodiffBackend;

use crate::config::TrainingConfig;
use crate::data::{BatchResult, DataLoaders, DatasetSplits};
use crate::error::{Result, TrainError};
use crate::metrics::{BatchMetrics, EpochReport, SplitMetrics, ThroughputReport, count_correct};
use crate::model::ResNet;
use crate::progress;
use crate::throughput::measure_dataloader_throughput;

/// Everything a finished run hands back.
pub struct TrainingOutcome<B: AutodiffBackend> {
    pub model: ResNet<B>,
    pub throughput: ThroughputReport,
    pub history: Vec<EpochReport>,
}

/// Builds the model, optimizer and loaders, runs the throughput probe, then trains.
///
/// `dataset_root` must contain `train/` and `val/` image folders.
pub fn run<B: AutodiffBackend>(
    config: &TrainingConfig,
    dataset_root: &Path,
    device: B::Device,
) -> Result<TrainingOutcome<B>> {
    if config.batch_size == 0 {
        return Err(TrainError::EmptyBatch);
    }

    let mut model = config.model.init::<B>(&device);
    let mut optimizer = AdamWConfig::new()
        .with_weight_decay(config.weight_decay as f32)
        .init::<B, ResNet<B>>();

    log::info!("Setting up ImageNet");
    log::debug!("Using {} dataloader workers", config.num_workers);
    let splits = DatasetSplits::load(dataset_root, &config.dataset)?;
    log::info!(
        "{} classes: {} training, {} validation and {} test images",
        splits.classes.len(),
        splits.train.len(),
        splits.valid.len(),
        splits.test.len()
    );
    let loaders = DataLoaders::<B>::new(splits, config, &device);

    log::info!("Beginning bottleneck diagnosis.");
    log::info!("Starting dataloader loop without training.");
    let throughput = measure_dataloader_throughput(&*loaders.train, config.test_batches)?;

    log::info!("Starting training loop.");
    let mut history = Vec::with_capacity(config.epochs);
    for epoch in 0..config.epochs {
        log::debug!("Starting epoch {epoch}/{}", config.epochs);

        let (trained, train) = train_epoch(
            model,
            &mut optimizer,
            &*loaders.train,
            config.learning_rate,
            epoch,
        )?;
        model = trained;

        let valid = validation_loop(&model.valid(), &*loaders.valid)?;
        log::info!(
            "Epoch {epoch}: Val loss: {:.3} accuracy: {:.2}%",
            valid.total_loss,
            valid.accuracy() * 100.0
        );

        history.push(EpochReport::new(epoch, train, valid));
    }

    Ok(TrainingOutcome {
        model,
        throughput,
        history,
    })
}

/// One pass over `loader`: forward, cross-entropy, backward and an optimizer step per batch.
pub fn train_epoch<B, O>(
    mut model: ResNet<B>,
    optimizer: &mut O,
    loader: &dyn DataLoader<B, BatchResult<B>>,
    learning_rate: f64,
    epoch: usize,
) -> Result<(ResNet<B>, SplitMetrics)>
where
    B: AutodiffBackend,
    O: Optimizer<ResNet<B>, B>,
{
    let progress = progress::image_bar(loader.num_items(), format!("Train epoch {epoch}"));
    let mut totals = SplitMetrics::default();

    for batch in loader.iter() {
        let batch = batch?;
        let samples = batch.len();

        let logits = model.forward(batch.images);
        let loss = cross_entropy(logits.clone(), batch.targets.clone());

        let grads = GradientsParams::from_grads(loss.backward(), &model);
        model = optimizer.step(learning_rate, model, grads);

        let metrics = BatchMetrics::new(
            loss.into_scalar().elem::<f64>(),
            count_correct(logits.detach(), batch.targets),
            samples,
        );
        log::debug!("Accuracy: {:.2}%", metrics.accuracy() * 100.0);
        log::debug!("Average Loss: {}", metrics.loss);
        totals.update(&metrics);

        progress.inc(samples as u64);
        progress.set_message(format!(
            "loss={:.4}, accuracy={:.4}",
            metrics.loss,
            metrics.accuracy()
        ));
    }
    progress.finish();

    Ok((model, totals))
}

/// Evaluates `model` on every batch of `loader`.
///
/// Runs on a non-autodiff backend, so no graph is recorded and batch norm uses
/// its running statistics.
pub fn validation_loop<B: Backend>(
    model: &ResNet<B>,
    loader: &dyn DataLoader<B, BatchResult<B>>,
) -> Result<SplitMetrics> {
    let mut totals = SplitMetrics::default();

    for batch in loader.iter() {
        let batch = batch?;
        let samples = batch.len();

        let logits = model.forward(batch.images);
        let loss = cross_entropy(logits.clone(), batch.targets.clone());

        totals.update(&BatchMetrics::new(
            loss.into_scalar().elem::<f64>(),
            count_correct(logits, batch.targets),
            samples,
        ));
    }

    Ok(totals)
}

fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, targets)
}
