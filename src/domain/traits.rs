// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training loop never talks to a deep-learning framework
// directly. It only sees these two traits:
//
//   Network   — forward pass (loss + accuracy), backward pass,
//               gradient zeroing
//   Optimizer — applies the accumulated gradients to a Network
//               and exposes its learning rate
//
// Implementations:
//   - BurnClassifier / BurnOptimizer (Layer 5) → Burn autodiff
//   - scripted mocks in the trainer tests      → no framework
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use ndarray::ArrayView4;

use crate::domain::metrics::Metrics;

/// Whether a forward pass is part of training or evaluation.
///
/// `Train` records the computation for a later backward pass and
/// keeps stochastic layers (dropout) active. `Eval` runs without
/// gradient tracking and with dropout disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

// ─── Network ─────────────────────────────────────────────────────────────────
/// A differentiable classifier with mutable weights.
pub trait Network {
    /// Forget any gradients and pending loss from the previous step.
    fn zero_grads(&mut self);

    /// Run the model on a batch `[N, C, H, W]` and score it against
    /// `labels`, returning the batch-mean loss and accuracy.
    fn forward(
        &mut self,
        images: ArrayView4<'_, f32>,
        labels: &[usize],
        mode:   Mode,
    ) -> Result<Metrics>;

    /// Back-propagate the loss of the last `Mode::Train` forward pass.
    fn backward(&mut self) -> Result<()>;
}

// ─── Optimizer ───────────────────────────────────────────────────────────────
/// Stateful weight updater for a particular kind of network.
pub trait Optimizer<N: Network> {
    /// Apply the gradients held by `net` to its weights.
    fn update(&mut self, net: &mut N) -> Result<()>;

    fn learning_rate(&self) -> f64;

    fn set_learning_rate(&mut self, lr: f64);
}
