use std::time::Duration;

use burn::prelude::*;
use burn::tensor::ElementConversion;
use derive_new::new;

/// Number of rows of `logits` whose highest score sits at the target class.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let predictions = logits.argmax(1).flatten::<1>(0, 1);
    let correct = predictions.equal(targets).int().sum().into_scalar();
    correct.elem::<i64>() as usize
}

fn ratio(correct: usize, samples: usize) -> f64 {
    if samples == 0 {
        return 0.0;
    }
    correct as f64 / samples as f64
}

/// Loss and accuracy of a single batch.
#[derive(new, Clone, Copy, Debug, PartialEq)]
pub struct BatchMetrics {
    /// Mean cross-entropy over the batch.
    pub loss: f64,
    pub correct: usize,
    pub samples: usize,
}

impl BatchMetrics {
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.samples)
    }
}

/// Totals accumulated over a pass on one split.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct SplitMetrics {
    /// Sum of the per-batch mean losses.
    pub total_loss: f64,
    pub batches: usize,
    pub correct: usize,
    pub samples: usize,
}

impl SplitMetrics {
    pub fn update(&mut self, batch: &BatchMetrics) {
        self.total_loss += batch.loss;
        self.batches += 1;
        self.correct += batch.correct;
        self.samples += batch.samples;
    }

    pub fn mean_loss(&self) -> f64 {
        if self.batches == 0 {
            return 0.0;
        }
        self.total_loss / self.batches as f64
    }

    /// Accuracy over every sample seen, not an average of batch accuracies.
    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.samples)
    }
}

/// Result of pulling batches from a loader without doing any model work.
#[derive(new, Clone, Copy, Debug, PartialEq)]
pub struct ThroughputReport {
    pub batches: usize,
    pub elapsed: Duration,
}

impl ThroughputReport {
    /// `None` when no batch was produced.
    pub fn seconds_per_batch(&self) -> Option<f64> {
        (self.batches > 0).then(|| self.elapsed.as_secs_f64() / self.batches as f64)
    }
}

/// What one epoch produced on the training and validation splits.
#[derive(new, Clone, Copy, Debug, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    pub train: SplitMetrics,
    pub valid: SplitMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn counts_argmax_matches() {
        let device = Default::default();
        let logits = Tensor::<TestBackend, 2>::from_floats(
            [[0.1, 0.9, 0.0], [2.0, 1.0, 0.5], [0.0, 0.2, 0.3], [1.0, 3.0, 2.0]],
            &device,
        );
        let targets = Tensor::<TestBackend, 1, Int>::from_ints([1, 0, 0, 2], &device);

        assert_eq!(count_correct(logits, targets), 2);
    }

    #[test]
    fn split_metrics_weight_accuracy_by_samples() {
        let mut metrics = SplitMetrics::default();
        metrics.update(&BatchMetrics::new(2.0, 4, 4));
        metrics.update(&BatchMetrics::new(1.0, 0, 1));

        assert_eq!(metrics.total_loss, 3.0);
        assert_eq!(metrics.mean_loss(), 1.5);
        assert_eq!(metrics.accuracy(), 0.8);
        assert_eq!(metrics.batches, 2);
    }

    #[test]
    fn empty_metrics_do_not_divide_by_zero() {
        let metrics = SplitMetrics::default();

        assert_eq!(metrics.accuracy(), 0.0);
        assert_eq!(metrics.mean_loss(), 0.0);
        assert_eq!(BatchMetrics::new(0.0, 0, 0).accuracy(), 0.0);
    }

    #[test]
    fn throughput_per_batch() {
        let report = ThroughputReport::new(4, Duration::from_millis(500));
        assert_eq!(report.seconds_per_batch(), Some(0.125));

        let empty = ThroughputReport::new(0, Duration::from_millis(500));
        assert_eq!(empty.seconds_per_batch(), None);
    }
}
