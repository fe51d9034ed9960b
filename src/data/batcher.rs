// ============================================================
// Layer 4 — Image Batcher
// ============================================================
// Converts an ndarray image batch plus its labels into Burn
// tensors on the run's device.
//
//   images: ArrayView4 [N, C, H, W]  → Tensor<B, 4>       [N, C, H, W]
//   labels: &[usize]     [N]         → Tensor<B, 1, Int>  [N]
//
// ndarray's iterator walks the view in logical (row-major)
// order even when the view is a strided slice, so flattening
// with .iter() and reshaping gives back the same layout.
//
// Reference: Burn Book §4 (Batcher)
//            ndarray documentation (iteration order)

use burn::prelude::*;
use ndarray::ArrayView4;

/// A batch of images ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct ImageBatch<B: Backend> {
    /// Pixels — shape: [batch_size, channels, height, width]
    pub images: Tensor<B, 4>,

    /// Ground-truth class indices — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Holds the target device so tensors are created on the
/// correct GPU/CPU.
#[derive(Clone, Debug)]
pub struct ImageBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ImageBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    pub fn batch(&self, images: ArrayView4<'_, f32>, labels: &[usize]) -> ImageBatch<B> {
        let (n, c, h, w) = images.dim();

        let pixels: Vec<f32> = images.iter().copied().collect();
        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([n, c, h, w]);

        // Burn Int tensors are built from i32 here, like the Q&A batcher did
        let targets: Vec<i32> = labels.iter().map(|&l| l as i32).collect();
        let targets = Tensor::<B, 1, Int>::from_ints(targets.as_slice(), &self.device);

        ImageBatch { images, targets }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use ndarray::{s, Array4};

    #[test]
    fn test_strided_view_keeps_layout() {
        let full = Array4::from_shape_fn((4, 3, 2, 2), |(i, c, y, x)| {
            (i * 100 + c * 10 + y * 2 + x) as f32
        });
        // Rows 1..3 of the full batch: a non-contiguous view is fine too
        let view    = full.slice(s![1..3, .., .., ..]);
        let batcher = ImageBatcher::<NdArray>::new(Default::default());
        let batch   = batcher.batch(view, &[7, 2]);

        assert_eq!(batch.images.dims(), [2, 3, 2, 2]);
        let pixels: Vec<f32> = batch.images.into_data().to_vec::<f32>().unwrap();
        assert_eq!(pixels[0], 100.0);
        assert_eq!(pixels[pixels.len() - 1], 223.0);

        let targets: Vec<i64> = batch
            .targets
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .unwrap();
        assert_eq!(targets, vec![7, 2]);
    }
}
