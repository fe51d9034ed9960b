// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training or scoring a checkpoint).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No console printing here (that's Layer 1); progress
//     goes through tracing
//   - No direct file parsing (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The training workflow
pub mod train_use_case;

// Scoring a saved checkpoint on the test set
pub mod evaluate_use_case;
