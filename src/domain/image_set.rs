// ============================================================
// Layer 3 — ImageSet Domain Type
// ============================================================
// An ordered collection of (image, label) pairs held as two
// dense arrays that always have the same length:
//
//   images: [N, channels, height, width]   (f32 pixels)
//   labels: [N]                            (class indices)
//
// For CIFAR-10 that is [N, 3, 32, 32] and labels in 0..10.
//
// Batches are produced in two ways:
//   - select(&indices) → gather rows in any order (training,
//                        driven by a random permutation)
//   - slice(range)     → a contiguous run of rows (evaluation,
//                        which walks the set in order)
//
// Reference: ndarray documentation (Array4, select, slice)
//            Rust Book §5 (Structs and Methods)

use anyhow::{ensure, Result};
use ndarray::{s, Array4, ArrayView4, Axis};
use std::ops::Range;

/// A dense image dataset with one label per image.
#[derive(Debug, Clone)]
pub struct ImageSet {
    /// Pixel data, shape [N, C, H, W]
    images: Array4<f32>,

    /// Class index for each of the N images
    labels: Vec<usize>,
}

impl ImageSet {
    /// Pair up an image array with its labels.
    /// Fails if the first axis of `images` does not match `labels.len()`.
    pub fn new(images: Array4<f32>, labels: Vec<usize>) -> Result<Self> {
        let n = images.len_of(Axis(0));
        ensure!(
            n == labels.len(),
            "image count ({n}) does not match label count ({})",
            labels.len()
        );
        Ok(Self { images, labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn images(&self) -> ArrayView4<'_, f32> {
        self.images.view()
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Image geometry as (channels, height, width)
    pub fn image_dims(&self) -> (usize, usize, usize) {
        let (_, c, h, w) = self.images.dim();
        (c, h, w)
    }

    /// Gather the rows at `indices` (in that order) into a new set.
    /// Panics if an index is out of range, like slice indexing.
    pub fn select(&self, indices: &[usize]) -> ImageSet {
        let images = self.images.select(Axis(0), indices);
        let labels = indices.iter().map(|&i| self.labels[i]).collect();
        ImageSet { images, labels }
    }

    /// Borrow the contiguous rows in `range` without copying pixels.
    pub fn slice(&self, range: Range<usize>) -> (ArrayView4<'_, f32>, &[usize]) {
        let images = self.images.slice(s![range.clone(), .., .., ..]);
        (images, &self.labels[range])
    }
}
