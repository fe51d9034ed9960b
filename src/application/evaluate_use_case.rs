// ============================================================
// Layer 2 — Evaluate Use Case
// ============================================================
// Scores a trained checkpoint on the CIFAR-10 test batch:
//   1. Read train_config.json to rebuild the same CNN
//   2. Load the latest saved weights into it
//   3. Run one forward-only pass over the test set, using the
//      evaluation form of the run's augmentation

use anyhow::Result;
use burn::tensor::backend::AutodiffBackend;

use crate::application::train_use_case::TrainConfig;
use crate::data::loader::CifarLoader;
use crate::domain::{image_set::ImageSet, metrics::Metrics};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::{
    classifier::BurnClassifier,
    device::{ComputeDevice, CpuBackend, GpuBackend},
    trainer::evaluate,
};

pub struct EvaluateUseCase {
    checkpoint_dir: String,
    /// Overrides the data directory recorded at training time
    data_dir:       Option<String>,
    /// Overrides the device recorded at training time
    device_id:      Option<i32>,
    batch_size:     Option<usize>,
    limit:          Option<usize>,
}

impl EvaluateUseCase {
    pub fn new(checkpoint_dir: String) -> Self {
        Self {
            checkpoint_dir,
            data_dir:   None,
            device_id:  None,
            batch_size: None,
            limit:      None,
        }
    }

    pub fn with_data_dir(mut self, dir: Option<String>) -> Self {
        self.data_dir = dir;
        self
    }

    pub fn with_device(mut self, id: Option<i32>) -> Self {
        self.device_id = id;
        self
    }

    pub fn with_batch_size(mut self, size: Option<usize>) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn execute(&self) -> Result<Metrics> {
        let ckpt = CheckpointManager::new(&self.checkpoint_dir)?;
        let cfg  = ckpt.load_config()?;

        let data_dir = self.data_dir.as_deref().unwrap_or(&cfg.data_dir);
        let test     = CifarLoader::new(data_dir).with_limit(self.limit).load_test()?;

        let device = ComputeDevice::from_id(self.device_id.unwrap_or(cfg.device_id));
        tracing::info!("Evaluating on device: {}", device);

        let batch_size = self.batch_size.unwrap_or(cfg.batch_size);
        match device {
            ComputeDevice::Cpu => {
                score::<CpuBackend>(&cfg, ComputeDevice::cpu_device(), &ckpt, &test, batch_size)
            }
            ComputeDevice::Gpu(index) => {
                score::<GpuBackend>(&cfg, ComputeDevice::gpu_device(index), &ckpt, &test, batch_size)
            }
        }
    }
}

fn score<B: AutodiffBackend>(
    cfg:        &TrainConfig,
    device:     B::Device,
    ckpt:       &CheckpointManager,
    test:       &ImageSet,
    batch_size: usize,
) -> Result<Metrics> {
    let model   = cfg.cnn_config().init::<B>(&device);
    let model   = ckpt.load_model(model, &device)?;
    let mut net = BurnClassifier::new(model, device);

    evaluate(&mut net, test, batch_size, &cfg.augmentation)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::augment::Augmentation;
    use burn::backend::{Autodiff, NdArray};
    use std::fs;

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let uc  = EvaluateUseCase::new(dir.path().to_string_lossy().into_owned());
        assert!(uc.execute().is_err());
    }

    #[test]
    fn test_scores_saved_checkpoint() {
        let data = tempfile::tempdir().unwrap();
        let out  = tempfile::tempdir().unwrap();

        let mut test_bytes = Vec::new();
        for label in 0..4u8 {
            test_bytes.push(label);
            test_bytes.extend(std::iter::repeat(label * 20).take(3072));
        }
        fs::write(data.path().join("test_batch.bin"), &test_bytes).unwrap();

        let cfg = TrainConfig {
            data_dir:       data.path().to_string_lossy().into_owned(),
            checkpoint_dir: out.path().to_string_lossy().into_owned(),
            augmentation:   Augmentation::CenterCrop { margin: 2 },
            ..TrainConfig::default()
        };
        let ckpt   = CheckpointManager::new(out.path()).unwrap();
        let device = Default::default();
        ckpt.save_config(&cfg).unwrap();
        ckpt.save_model(&cfg.cnn_config().init::<Autodiff<NdArray>>(&device), 1).unwrap();

        let metrics = EvaluateUseCase::new(cfg.checkpoint_dir.clone())
            .with_batch_size(Some(3))
            .execute()
            .unwrap();
        assert!(metrics.loss.is_finite());
        assert!((0.0..=1.0).contains(&metrics.accuracy));
    }
}
