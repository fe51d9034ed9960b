// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates a full training run in order:
//
//   Step 1: Load CIFAR-10 train + test   (Layer 4 - data)
//   Step 2: Hold out a validation split  (Layer 4 - data)
//   Step 3: Save config, open CSV log    (Layer 6 - infra)
//   Step 4: Pick the backend for device  (Layer 5 - ml)
//   Step 5: Build CNN + optimizer        (Layer 5 - ml)
//   Step 6: Run Trainer::fit_with_callback; after each epoch
//           log a summary, append to metrics.csv, save a
//           checkpoint every `save_every` epochs, and apply
//           the learning-rate decay schedule
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{ensure, Result};
use burn::tensor::backend::AutodiffBackend;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::data::{
    augment::Augmentation,
    loader::{CifarLoader, IMAGE_SIZE, NUM_CLASSES},
    splitter::split_train_val,
};
use crate::domain::{
    image_set::ImageSet,
    metrics::EpochStats,
    traits::Optimizer,
};
use crate::infra::{checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    classifier::{adam, momentum_sgd, BurnClassifier},
    device::{ComputeDevice, CpuBackend, GpuBackend},
    model::CnnConfig,
    schedule::StepSchedule,
    trainer::{Trainer, TrainerConfig},
};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings of a training run. Saved as JSON next to the
// checkpoints so `evaluate` can rebuild the same model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub data_dir:        String,
    pub checkpoint_dir:  String,
    pub epochs:          usize,
    pub batch_size:      usize,
    /// -1 = CPU, n >= 0 = GPU n
    pub device_id:       i32,
    pub lr:              f64,
    pub optimizer:       OptimizerKind,
    pub momentum:        f64,
    pub augmentation:    Augmentation,
    pub dropout:         f64,
    pub valid_fraction:  f64,
    pub lr_decay_epochs: Vec<usize>,
    pub lr_decay_factor: f64,
    pub save_every:      usize,
    pub seed:            Option<u64>,
    pub limit:           Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizerKind {
    Adam,
    Momentum,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:        "data/cifar-10-batches-bin".to_string(),
            checkpoint_dir:  "checkpoints".to_string(),
            epochs:          100,
            batch_size:      100,
            device_id:       -1,
            lr:              1e-3,
            optimizer:       OptimizerKind::Adam,
            momentum:        0.9,
            augmentation:    Augmentation::default(),
            dropout:         0.5,
            valid_fraction:  0.0,
            lr_decay_epochs: Vec::new(),
            lr_decay_factor: 0.1,
            save_every:      10,
            seed:            None,
            limit:           None,
        }
    }
}

impl TrainConfig {
    /// CNN hyper-parameters implied by this run (input size follows the crop).
    pub fn cnn_config(&self) -> CnnConfig {
        CnnConfig::new(NUM_CLASSES, self.augmentation.output_size(IMAGE_SIZE))
            .with_dropout(self.dropout)
    }

    fn trainer_config(&self) -> TrainerConfig {
        TrainerConfig {
            epoch_num:    self.epochs,
            batch_size:   self.batch_size,
            augmentation: self.augmentation,
            seed:         self.seed,
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "--batch-size must be at least 1");
        ensure!(self.save_every > 0, "--save-every must be at least 1");
        ensure!(self.lr > 0.0, "--lr must be positive");
        ensure!(self.momentum >= 0.0, "--momentum must not be negative");
        ensure!(self.lr_decay_factor > 0.0, "--lr-decay-factor must be positive");
        ensure!(
            (0.0..1.0).contains(&self.dropout),
            "--dropout must be in [0, 1), got {}",
            self.dropout
        );
        ensure!(
            (0.0..1.0).contains(&self.valid_fraction),
            "--valid-fraction must be in [0, 1)"
        );
        self.augmentation.validate(IMAGE_SIZE, IMAGE_SIZE)
    }
}

/// Borrowed datasets for one run
struct RunData<'a> {
    train: &'a ImageSet,
    valid: Option<&'a ImageSet>,
    test:  &'a ImageSet,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline and return every epoch's statistics.
    pub fn execute(&self) -> Result<Vec<EpochStats>> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load CIFAR-10 ─────────────────────────────────────────────
        tracing::info!("Loading CIFAR-10 from '{}'", cfg.data_dir);
        let loader     = CifarLoader::new(&cfg.data_dir).with_limit(cfg.limit);
        let full_train = loader.load_train()?;
        let test       = loader.load_test()?;

        // ── Step 2: Validation split ──────────────────────────────────────────
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None       => StdRng::from_entropy(),
        };
        let (train, valid) = split_train_val(&full_train, cfg.valid_fraction, &mut rng);
        tracing::info!(
            "Split: {} train, {} validation, {} test",
            train.len(),
            valid.as_ref().map_or(0, ImageSet::len),
            test.len()
        );

        // ── Step 3: Persist config, open metrics log ──────────────────────────
        let ckpt   = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt.save_config(cfg)?;
        let logger = MetricsLogger::new(&cfg.checkpoint_dir)?;
        tracing::info!("Logging metrics to '{}'", logger.csv_path().display());

        // ── Step 4: Backend dispatch ──────────────────────────────────────────
        let data   = RunData { train: &train, valid: valid.as_ref(), test: &test };
        let device = ComputeDevice::from_id(cfg.device_id);
        tracing::info!("Using device: {}", device);

        match device {
            ComputeDevice::Cpu => {
                run::<CpuBackend>(cfg, ComputeDevice::cpu_device(), data, &ckpt, &logger)
            }
            ComputeDevice::Gpu(index) => {
                run::<GpuBackend>(cfg, ComputeDevice::gpu_device(index), data, &ckpt, &logger)
            }
        }
    }
}

// ── Step 5: Model + optimizer ─────────────────────────────────────────────────
fn run<B: AutodiffBackend>(
    cfg:    &TrainConfig,
    device: B::Device,
    data:   RunData<'_>,
    ckpt:   &CheckpointManager,
    logger: &MetricsLogger,
) -> Result<Vec<EpochStats>> {
    let model_cfg = cfg.cnn_config();
    let model     = model_cfg.init::<B>(&device);
    tracing::info!(
        "Model ready: CNN on {}x{} inputs, {} features",
        model_cfg.image_size,
        model_cfg.image_size,
        model_cfg.feature_len()
    );
    let net = BurnClassifier::new(model, device);

    match cfg.optimizer {
        OptimizerKind::Adam     => fit(cfg, net, adam::<B>(cfg.lr), data, ckpt, logger),
        OptimizerKind::Momentum => {
            fit(cfg, net, momentum_sgd::<B>(cfg.lr, cfg.momentum), data, ckpt, logger)
        }
    }
}

// ── Step 6: Training loop with per-epoch reporting ────────────────────────────
fn fit<B, O>(
    cfg:    &TrainConfig,
    net:    BurnClassifier<B>,
    opt:    O,
    data:   RunData<'_>,
    ckpt:   &CheckpointManager,
    logger: &MetricsLogger,
) -> Result<Vec<EpochStats>>
where
    B: AutodiffBackend,
    O: Optimizer<BurnClassifier<B>>,
{
    let schedule    = StepSchedule::new(cfg.lr_decay_epochs.clone(), cfg.lr_decay_factor);
    let mut trainer = Trainer::new(net, opt, cfg.trainer_config());

    let history = trainer.fit_with_callback(
        data.train,
        data.valid,
        Some(data.test),
        |stats, net, opt| {
            let finished = stats.epoch + 1;
            tracing::info!("{}", epoch_summary(stats, cfg.epochs));
            logger.log(stats)?;

            if finished % cfg.save_every == 0 || finished == cfg.epochs {
                ckpt.save_model(net.model(), finished)?;
                tracing::info!("Checkpoint saved for epoch {}", finished);
            }

            if let Some(lr) = schedule.apply::<BurnClassifier<B>, O>(finished, opt) {
                tracing::info!("Learning rate decayed to {:e}", lr);
            }
            Ok(())
        },
    )?;

    tracing::info!("Training complete!");
    Ok(history)
}

/// One console line per epoch.
pub fn epoch_summary(stats: &EpochStats, epochs: usize) -> String {
    let mut line = format!(
        "Epoch {:>3}/{} | train_loss={:.4} train_acc={:.2}%",
        stats.epoch + 1,
        epochs,
        stats.train.loss,
        stats.train.accuracy * 100.0,
    );
    if let Some(v) = stats.valid {
        line.push_str(&format!(" | valid_loss={:.4} valid_acc={:.2}%", v.loss, v.accuracy * 100.0));
    }
    if let Some(t) = stats.test {
        line.push_str(&format!(" | test_loss={:.4} test_acc={:.2}%", t.loss, t.accuracy * 100.0));
    }
    if let Some(d) = stats.test_elapsed {
        line.push_str(&format!(" ({:.2}s)", d.as_secs_f64()));
    }
    line
}
