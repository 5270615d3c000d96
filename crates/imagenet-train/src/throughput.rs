use std::time::Instant;

use burn::data::dataloader::DataLoader;
use burn::prelude::Backend;

use crate::data::BatchResult;
use crate::error::Result;
use crate::metrics::ThroughputReport;
use crate::progress;

/// Pulls up to `max_batches` batches from `loader` and times it, without touching a model.
///
/// This is the baseline the training loop can be compared against: if a training
/// step is not much slower than a batch here, the loader is the bottleneck.
pub fn measure_dataloader_throughput<B: Backend>(
    loader: &dyn DataLoader<B, BatchResult<B>>,
    max_batches: usize,
) -> Result<ThroughputReport> {
    let progress = progress::batch_bar(max_batches, "Dataloader throughput test");
    let start = Instant::now();

    let mut batches = 0;
    for batch in loader.iter().take(max_batches) {
        batch?;
        batches += 1;
        progress.inc(1);
    }

    let report = ThroughputReport::new(batches, start.elapsed());
    progress.finish_and_clear();

    match report.seconds_per_batch() {
        Some(seconds) => log::info!("Baseline dataloader speed: {seconds:.3} s/batch"),
        None => log::warn!("The dataloader produced no batch, no baseline speed to report"),
    }

    Ok(report)
}
