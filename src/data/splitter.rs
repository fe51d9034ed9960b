// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Holds out a random fraction of the training images as a
// validation set:
//   - Training set:   used to update model weights
//   - Validation set: scored every epoch, never trained on
//
// CIFAR-10 ships only train and test splits, so validation
// has to be carved out of the 50 000 training images.
//
// We shuffle INDICES (not pixels) with a Fisher-Yates shuffle
// from rand::seq::SliceRandom, then gather both halves with
// ImageSet::select. The RNG is passed in so a seeded run always
// holds out the same images.
//
// Reference: Rust Book §8 (Vectors)
//            rand crate documentation

use rand::{seq::SliceRandom, Rng};

use crate::domain::image_set::ImageSet;

/// Shuffle `0..total` and cut it into (train, validation) index lists.
///
/// # Arguments
/// * `total`          - Number of items to split
/// * `valid_fraction` - Proportion held out, e.g. 0.1 = 10%
pub fn split_indices<R: Rng>(total: usize, valid_fraction: f64, rng: &mut R) -> (Vec<usize>, Vec<usize>) {
    let mut indices: Vec<usize> = (0..total).collect();
    indices.shuffle(rng);

    // e.g. 100 items * 0.1 = 10 → last 10 shuffled indices are validation
    let n_valid  = ((total as f64) * valid_fraction.clamp(0.0, 1.0)).round() as usize;
    let split_at = total - n_valid.min(total);

    // split_off(n) removes elements [n..] from the Vec and returns them
    let valid = indices.split_off(split_at);
    (indices, valid)
}

/// Split an ImageSet into (train, validation).
///
/// Returns `None` for the validation half when the fraction rounds
/// to zero images, so callers can skip the validation pass entirely.
pub fn split_train_val<R: Rng>(
    set:            &ImageSet,
    valid_fraction: f64,
    rng:            &mut R,
) -> (ImageSet, Option<ImageSet>) {
    let (train_idx, valid_idx) = split_indices(set.len(), valid_fraction, rng);

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        train_idx.len(),
        valid_idx.len(),
    );

    let valid = (!valid_idx.is_empty()).then(|| set.select(&valid_idx));
    (set.select(&train_idx), valid)
}
