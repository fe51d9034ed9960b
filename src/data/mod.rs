// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between the CIFAR-10 .bin files on disk and the
// tensors handed to the model.
//
//   data_batch_*.bin / test_batch.bin
//       │
//       ▼
//   CifarLoader       → decodes records into an ImageSet
//       │
//       ▼
//   split_train_val   → optional held-out validation set
//       │
//       ▼
//   Augmentation      → random shift + mirror / centre crop
//       │                (applied per batch by the Trainer)
//       ▼
//   ImageBatcher      → ndarray batch → Burn tensors
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads CIFAR-10 binary batch files
pub mod loader;

/// Random shift / mirror and centre-crop transforms
pub mod augment;

/// Converts ndarray batches into Burn tensors
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
