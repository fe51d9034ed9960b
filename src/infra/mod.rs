// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting file output used by the application layer:
//
//   checkpoint.rs — Saving and loading model weights
//                   Uses Burn's CompactRecorder to serialise
//                   the CNN parameters. Also saves/loads the
//                   TrainConfig as JSON so `evaluate` can
//                   rebuild the model.
//
//   metrics.rs    — Per-epoch CSV log of train / validation /
//                   test loss and accuracy.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;
