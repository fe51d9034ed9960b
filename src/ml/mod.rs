// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that trains or runs a model lives here.
//
//   trainer.rs    — The training loop controller
//                   Epochs, shuffling, batching, augmentation,
//                   forward/backward/update, weighted metrics,
//                   validation/test passes and the per-epoch
//                   callback. Written against the domain
//                   Network / Optimizer traits only.
//
//   model.rs      — The CNN classifier (Burn Module)
//                   3 × (5×5 conv → ReLU → 2×2 max-pool)
//                   → dropout → FC 1000 → ReLU → dropout → FC
//
//   classifier.rs — Burn adapters
//                   BurnClassifier: Network over Cnn<B>
//                   BurnOptimizer:  Optimizer over Adam / SGD
//
//   device.rs     — device id → Burn backend (NdArray / Wgpu)
//
//   schedule.rs   — step learning-rate decay between epochs
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// CNN image classifier architecture
pub mod model;

/// Burn-backed Network and Optimizer implementations
pub mod classifier;

/// Epoch/batch training loop with validation and test passes
pub mod trainer;

/// CPU / GPU backend selection
pub mod device;

/// Learning-rate decay milestones
pub mod schedule;
