// ============================================================
// Layer 5 — Learning-Rate Schedule
// ============================================================
// Step decay applied between epochs from the per-epoch
// callback: after each listed epoch finishes, the optimizer's
// learning rate is multiplied by a fixed factor.
//
//   milestones = [50, 75], factor = 0.1
//   epochs  1..=50  lr
//   epochs 51..=75  lr * 0.1
//   epochs 76..     lr * 0.01

use crate::domain::traits::{Network, Optimizer};

/// Multiply the learning rate by `factor` once each listed epoch finishes.
///
/// Milestones are 1-based epoch counts: `[150, 225]` decays after the
/// 150th and the 225th epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct StepSchedule {
    milestones: Vec<usize>,
    factor:     f64,
}

impl StepSchedule {
    pub fn new(milestones: Vec<usize>, factor: f64) -> Self {
        Self { milestones, factor }
    }

    /// Decay `optimizer` if `finished_epochs` is a milestone.
    /// Returns the new learning rate when a decay happened.
    pub fn apply<N, O>(&self, finished_epochs: usize, optimizer: &mut O) -> Option<f64>
    where
        N: Network,
        O: Optimizer<N>,
    {
        if !self.milestones.contains(&finished_epochs) {
            return None;
        }
        let lr = optimizer.learning_rate() * self.factor;
        optimizer.set_learning_rate(lr);
        Some(lr)
    }
}
