// ============================================================
// Layer 3 — Metrics and Epoch Statistics
// ============================================================
// Loss/accuracy bookkeeping shared by every phase of an epoch.
//
// Weighted averaging:
//   Each batch reports its mean loss and mean accuracy.
//   The final batch of a pass is usually smaller than the rest,
//   so averaging per-batch values would over-weight it.
//   Instead we accumulate  metric * batch_len  and divide by
//   the number of samples in the whole pass:
//
//     10 images, batch_size 4 → batches [4, 4, 2]
//     loss = (l1*4 + l2*4 + l3*2) / 10
//
// Reference: Rust Book §5 (Structs), §8 (Collections)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Mean loss and accuracy of one batch or one whole pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Mean cross-entropy loss
    pub loss: f64,

    /// Fraction of correct predictions, in [0.0, 1.0]
    pub accuracy: f64,
}

impl Metrics {
    pub fn new(loss: f64, accuracy: f64) -> Self {
        Self { loss, accuracy }
    }
}

// ─── MetricAccumulator ───────────────────────────────────────────────────────
/// Running sums of batch metrics weighted by batch length.
#[derive(Debug, Default, Clone)]
pub struct MetricAccumulator {
    loss_sum:     f64,
    accuracy_sum: f64,
    samples:      usize,
}

impl MetricAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one batch's mean metrics, counted `batch_len` times.
    pub fn add(&mut self, batch: Metrics, batch_len: usize) {
        self.loss_sum     += batch.loss * batch_len as f64;
        self.accuracy_sum += batch.accuracy * batch_len as f64;
        self.samples      += batch_len;
    }

    /// Number of samples seen so far
    #[cfg(test)]
    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Divide the weighted sums by `total` samples.
    pub fn average_over(&self, total: usize) -> Result<Metrics> {
        ensure!(total > 0, "cannot average metrics over zero samples");
        Ok(Metrics {
            loss:     self.loss_sum / total as f64,
            accuracy: self.accuracy_sum / total as f64,
        })
    }
}

// ─── EpochStats ──────────────────────────────────────────────────────────────
/// Everything measured during one epoch, handed to the fit callback.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochStats {
    /// Zero-based epoch index
    pub epoch: usize,

    /// Weighted mean over the whole (shuffled, augmented) training set
    pub train: Metrics,

    /// Present only when a validation set was supplied
    pub valid: Option<Metrics>,

    /// Present only when a test set was supplied
    pub test: Option<Metrics>,

    /// Wall-clock time spent on the test pass
    pub test_elapsed: Option<Duration>,
}
