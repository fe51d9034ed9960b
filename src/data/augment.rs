// ============================================================
// Layer 4 — Image Augmentation
// ============================================================
// Transforms applied to every training batch before the
// forward pass. Three policies are available:
//
//   RandomShift { max_offset: 4, mirror: true }
//     For each image independently:
//       1. pick dy, dx uniformly in [-max_offset, max_offset]
//       2. flip a coin for horizontal mirroring
//       3. mirror the image (if chosen), then move its content
//          by (dy, dx) into a zero canvas of the SAME size.
//          Pixels pushed past the border are dropped.
//     Output shape == input shape, e.g. [N, 3, 32, 32].
//
//   CenterCrop { margin: 2 }
//     Cut `margin` rows/cols from every side, no randomness.
//     32×32 → rows/cols 2..30 → 28×28.
//
//   Identity
//     Copy the batch unchanged.
//
// Evaluation batches never see randomness: a centre-cropped
// model must be evaluated on centre crops too, while a model
// trained with random shifts is evaluated on the raw images.
// `for_evaluation()` encodes that mapping.
//
// Reference: rand crate documentation (Rng::gen_range, gen_bool)
//            ndarray documentation (outer_iter, slicing)

use anyhow::{ensure, Result};
use ndarray::{s, Array4, ArrayView3, ArrayView4, ArrayViewMut3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Largest shift used by the default random-shift policy
pub const DEFAULT_MAX_OFFSET: usize = 4;

/// Border removed by the default centre-crop policy
pub const DEFAULT_CROP_MARGIN: usize = 2;

/// Per-batch image transformation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Augmentation {
    /// Leave images untouched
    Identity,

    /// Fixed crop of `margin` pixels from every border
    CenterCrop { margin: usize },

    /// Random translation in [-max_offset, max_offset] on both axes,
    /// optionally preceded by a random horizontal mirror
    RandomShift { max_offset: usize, mirror: bool },
}

impl Default for Augmentation {
    fn default() -> Self {
        Augmentation::RandomShift {
            max_offset: DEFAULT_MAX_OFFSET,
            mirror:     true,
        }
    }
}

impl Augmentation {
    /// Transform a training batch `[N, C, H, W]`.
    pub fn apply<R: Rng>(&self, images: ArrayView4<'_, f32>, rng: &mut R) -> Array4<f32> {
        match *self {
            Augmentation::Identity              => images.to_owned(),
            Augmentation::CenterCrop { margin } => center_crop(images, margin),
            Augmentation::RandomShift { max_offset, mirror } => {
                let max     = max_offset as isize;
                let mut out = Array4::<f32>::zeros(images.raw_dim());

                for (src, dst) in images.outer_iter().zip(out.outer_iter_mut()) {
                    let dy   = rng.gen_range(-max..=max);
                    let dx   = rng.gen_range(-max..=max);
                    let flip = mirror && rng.gen_bool(0.5);
                    shift_image(src, dst, dy, dx, flip);
                }
                out
            }
        }
    }

    /// The deterministic policy matching this one for validation/test passes.
    pub fn for_evaluation(&self) -> Augmentation {
        match *self {
            Augmentation::CenterCrop { margin } => Augmentation::CenterCrop { margin },
            _                                   => Augmentation::Identity,
        }
    }

    /// Transform an evaluation batch with `for_evaluation()`'s policy.
    pub fn apply_eval(&self, images: ArrayView4<'_, f32>) -> Array4<f32> {
        match self.for_evaluation() {
            Augmentation::CenterCrop { margin } => center_crop(images, margin),
            _                                   => images.to_owned(),
        }
    }

    /// Side length of the images this policy produces from `size`×`size` input.
    pub fn output_size(&self, size: usize) -> usize {
        match *self {
            Augmentation::CenterCrop { margin } => size.saturating_sub(2 * margin),
            _                                   => size,
        }
    }

    /// Check the policy can be applied to `height`×`width` images.
    pub fn validate(&self, height: usize, width: usize) -> Result<()> {
        if let Augmentation::CenterCrop { margin } = *self {
            ensure!(
                2 * margin < height && 2 * margin < width,
                "crop margin {margin} leaves nothing of a {height}x{width} image"
            );
        }
        Ok(())
    }
}

/// Remove `margin` pixels from each border of every image.
pub fn center_crop(images: ArrayView4<'_, f32>, margin: usize) -> Array4<f32> {
    let (_, _, h, w) = images.dim();
    images
        .slice(s![.., .., margin..h - margin, margin..w - margin])
        .to_owned()
}

/// Write `src` moved by (dy, dx) into the zeroed canvas `dst`.
///
/// With `mirror` the source columns are read right-to-left first,
/// so `dst[c, y, x] = src[c, y - dy, w - 1 - (x - dx)]` wherever
/// the source coordinate is inside the image.
pub fn shift_image(
    src:    ArrayView3<'_, f32>,
    mut dst: ArrayViewMut3<'_, f32>,
    dy:     isize,
    dx:     isize,
    mirror: bool,
) {
    let (_, h, w) = src.dim();
    let (h, w)    = (h as isize, w as isize);
    let src       = if mirror { src.slice_move(s![.., .., ..;-1]) } else { src };

    // Destination window whose source coordinates stay inside the image
    let (y0, y1) = (dy.max(0), (h + dy).min(h));
    let (x0, x1) = (dx.max(0), (w + dx).min(w));
    if y0 >= y1 || x0 >= x1 {
        return;
    }

    dst.slice_mut(s![.., y0..y1, x0..x1])
        .assign(&src.slice(s![.., y0 - dy..y1 - dy, x0 - dx..x1 - dx]));
}
