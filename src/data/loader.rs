// ============================================================
// Layer 4 — CIFAR-10 Loader
// ============================================================
// Reads the CIFAR-10 "binary version" distribution.
//
// File layout:
//   cifar-10-batches-bin/
//     data_batch_1.bin … data_batch_5.bin   ← 50 000 training images
//     test_batch.bin                        ← 10 000 test images
//
// Each file is a flat sequence of 3073-byte records:
//
//   [label: 1 byte][red: 1024 bytes][green: 1024][blue: 1024]
//
// Each colour plane is a 32×32 image stored row by row, which is
// exactly the [channel, row, col] order we keep in memory. So a
// record maps onto one [3, 32, 32] slab without any reordering.
//
// Pixels are bytes 0..=255 and are scaled to [0.0, 1.0].
//
// Reference: https://www.cs.toronto.edu/~kriz/cifar.html
//            Rust Book §9 (Error Handling), §12 (Reading files)

use anyhow::{ensure, Context, Result};
use ndarray::Array4;
use std::{fs, path::{Path, PathBuf}};

use crate::domain::image_set::ImageSet;

pub const IMAGE_SIZE:  usize = 32;
pub const CHANNELS:    usize = 3;
pub const NUM_CLASSES: usize = 10;

const PIXELS_PER_IMAGE: usize = CHANNELS * IMAGE_SIZE * IMAGE_SIZE;
const RECORD_LEN:       usize = 1 + PIXELS_PER_IMAGE;

const TRAIN_FILES: [&str; 5] = [
    "data_batch_1.bin",
    "data_batch_2.bin",
    "data_batch_3.bin",
    "data_batch_4.bin",
    "data_batch_5.bin",
];
const TEST_FILE: &str = "test_batch.bin";

/// Loads CIFAR-10 binary batch files from one directory.
pub struct CifarLoader {
    /// Directory holding the *.bin files
    dir: PathBuf,

    /// Stop after this many images per split (None = everything)
    limit: Option<usize>,
}

impl CifarLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), limit: None }
    }

    /// Cap the number of images read per split. Handy for smoke runs.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Load the five training batches as one ImageSet.
    pub fn load_train(&self) -> Result<ImageSet> {
        let paths: Vec<PathBuf> = TRAIN_FILES.iter().map(|f| self.dir.join(f)).collect();
        self.load_files(&paths)
    }

    /// Load the test batch.
    pub fn load_test(&self) -> Result<ImageSet> {
        self.load_files(&[self.dir.join(TEST_FILE)])
    }

    fn load_files(&self, paths: &[PathBuf]) -> Result<ImageSet> {
        let mut pixels: Vec<f32>  = Vec::new();
        let mut labels: Vec<usize> = Vec::new();

        for path in paths {
            if self.limit.is_some_and(|l| labels.len() >= l) {
                break;
            }
            let before = labels.len();
            read_records(path, &mut pixels, &mut labels, self.limit)?;
            tracing::debug!(
                "Read {} images from '{}'",
                labels.len() - before,
                path.display()
            );
        }

        let n      = labels.len();
        let images = Array4::from_shape_vec((n, CHANNELS, IMAGE_SIZE, IMAGE_SIZE), pixels)
            .context("CIFAR pixel buffer has an unexpected length")?;

        tracing::info!("Loaded {} CIFAR-10 images from '{}'", n, self.dir.display());
        ImageSet::new(images, labels)
    }
}

/// Append every record of one .bin file to `pixels` / `labels`.
fn read_records(
    path:   &Path,
    pixels: &mut Vec<f32>,
    labels: &mut Vec<usize>,
    limit:  Option<usize>,
) -> Result<()> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read CIFAR batch '{}'", path.display()))?;

    ensure!(
        bytes.len() % RECORD_LEN == 0,
        "'{}' is {} bytes, not a whole number of {}-byte CIFAR records",
        path.display(),
        bytes.len(),
        RECORD_LEN
    );

    for record in bytes.chunks_exact(RECORD_LEN) {
        if limit.is_some_and(|l| labels.len() >= l) {
            break;
        }
        let label = record[0] as usize;
        ensure!(
            label < NUM_CLASSES,
            "'{}' contains label {label}, expected 0..{NUM_CLASSES}",
            path.display()
        );
        labels.push(label);
        pixels.extend(record[1..].iter().map(|&b| b as f32 / 255.0));
    }
    Ok(())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// One record whose red plane is 255, green 0, blue 51.
    fn record(label: u8) -> Vec<u8> {
        let mut r = vec![label];
        r.extend(std::iter::repeat(255u8).take(1024));
        r.extend(std::iter::repeat(0u8).take(1024));
        r.extend(std::iter::repeat(51u8).take(1024));
        r
    }

    #[test]
    fn test_decodes_label_and_channel_planes() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = record(3);
        bytes.extend(record(9));
        fs::write(dir.path().join(TEST_FILE), bytes).unwrap();

        let set = CifarLoader::new(dir.path()).load_test().unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.labels(), &[3, 9]);
        assert_eq!(set.image_dims(), (3, 32, 32));

        let imgs = set.images();
        assert_eq!(imgs[[0, 0, 31, 31]], 1.0);
        assert_eq!(imgs[[0, 1, 0, 0]], 0.0);
        assert!((imgs[[1, 2, 5, 7]] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_limit_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        let bytes: Vec<u8> = (0..5).flat_map(|i| record(i)).collect();
        fs::write(dir.path().join(TEST_FILE), bytes).unwrap();

        let set = CifarLoader::new(dir.path())
            .with_limit(Some(2))
            .load_test()
            .unwrap();
        assert_eq!(set.labels(), &[0, 1]);
    }

    #[test]
    fn test_truncated_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = record(1);
        bytes.pop();
        fs::write(dir.path().join(TEST_FILE), bytes).unwrap();
        assert!(CifarLoader::new(dir.path()).load_test().is_err());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let loader = CifarLoader::new("/definitely/not/here");
        assert!(loader.load_train().is_err());
    }
}
