// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits describing what a training run
// works with:
//
//   image_set.rs — dense (images, labels) dataset
//   metrics.rs   — loss/accuracy, weighted accumulation,
//                  per-epoch statistics
//   traits.rs    — the Network / Optimizer seams the training
//                  loop is written against
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

pub mod image_set;

pub mod metrics;

pub mod traits;
