// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `train` and `evaluate`
// and all their configurable flags.
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for bad values
//   - type conversion (string → usize, f64, enums, lists)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::{OptimizerKind, TrainConfig};
use crate::data::augment::{Augmentation, DEFAULT_CROP_MARGIN, DEFAULT_MAX_OFFSET};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the CNN on the CIFAR-10 binary batches
    Train(TrainArgs),

    /// Score the latest checkpoint on the CIFAR-10 test batch
    Evaluate(EvaluateArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptimizerArg {
    Adam,
    /// SGD with momentum
    Momentum,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum AugmentArg {
    /// Random translation (±4 px) plus horizontal mirror
    Shift,
    /// Fixed 2 px border crop (32×32 → 28×28)
    Crop,
    #[value(name = "none")]
    Identity,
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding data_batch_{1..5}.bin and test_batch.bin
    #[arg(long, default_value = "data/cifar-10-batches-bin")]
    pub data_dir: String,

    /// Directory for checkpoints, config and metrics.csv
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    #[arg(long, default_value_t = 100)]
    pub batch_size: usize,

    /// -1 trains on the CPU; n >= 0 selects GPU n
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    pub device: i32,

    #[arg(long, default_value_t = 1e-3)]
    pub lr: f64,

    #[arg(long, value_enum, default_value_t = OptimizerArg::Adam)]
    pub optimizer: OptimizerArg,

    /// Momentum coefficient (only used with --optimizer momentum)
    #[arg(long, default_value_t = 0.9)]
    pub momentum: f64,

    #[arg(long, value_enum, default_value_t = AugmentArg::Shift)]
    pub augment: AugmentArg,

    #[arg(long, default_value_t = 0.5)]
    pub dropout: f64,

    /// Share of the training images held out for validation
    #[arg(long, default_value_t = 0.0)]
    pub valid_fraction: f64,

    /// Epoch numbers after which the learning rate is decayed, e.g. 50,75
    #[arg(long, value_delimiter = ',')]
    pub lr_decay_epochs: Vec<usize>,

    #[arg(long, default_value_t = 0.1)]
    pub lr_decay_factor: f64,

    /// Save a checkpoint every N epochs (the final epoch is always saved)
    #[arg(long, default_value_t = 10)]
    pub save_every: usize,

    /// Seed for shuffling, augmentation and the validation split
    #[arg(long)]
    pub seed: Option<u64>,

    /// Read at most N images per split
    #[arg(long)]
    pub limit: Option<usize>,
}

impl From<AugmentArg> for Augmentation {
    fn from(a: AugmentArg) -> Self {
        match a {
            AugmentArg::Shift => Augmentation::RandomShift {
                max_offset: DEFAULT_MAX_OFFSET,
                mirror:     true,
            },
            AugmentArg::Crop => Augmentation::CenterCrop { margin: DEFAULT_CROP_MARGIN },
            AugmentArg::Identity => Augmentation::Identity,
        }
    }
}

impl From<OptimizerArg> for OptimizerKind {
    fn from(o: OptimizerArg) -> Self {
        match o {
            OptimizerArg::Adam     => OptimizerKind::Adam,
            OptimizerArg::Momentum => OptimizerKind::Momentum,
        }
    }
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:        a.data_dir,
            checkpoint_dir:  a.checkpoint_dir,
            epochs:          a.epochs,
            batch_size:      a.batch_size,
            device_id:       a.device,
            lr:              a.lr,
            optimizer:       a.optimizer.into(),
            momentum:        a.momentum,
            augmentation:    a.augment.into(),
            dropout:         a.dropout,
            valid_fraction:  a.valid_fraction,
            lr_decay_epochs: a.lr_decay_epochs,
            lr_decay_factor: a.lr_decay_factor,
            save_every:      a.save_every,
            seed:            a.seed,
            limit:           a.limit,
        }
    }
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Directory where `train` saved its checkpoints
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Defaults to the data directory used for training
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Defaults to the device used for training
    #[arg(long, allow_negative_numbers = true)]
    pub device: Option<i32>,

    #[arg(long)]
    pub batch_size: Option<usize>,

    #[arg(long)]
    pub limit: Option<usize>,
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn train_config(args: &[&str]) -> TrainConfig {
        let argv = ["cifar-trainer", "train"].iter().chain(args).copied();
        match Cli::parse_from(argv).command {
            Commands::Train(a) => a.into(),
            other => panic!("expected train, got {other:?}"),
        }
    }

    #[test]
    fn test_train_defaults() {
        let cfg = train_config(&[]);
        assert_eq!(cfg.epochs, 100);
        assert_eq!(cfg.batch_size, 100);
        assert_eq!(cfg.device_id, -1);
        assert_eq!(cfg.optimizer, OptimizerKind::Adam);
        assert_eq!(cfg.augmentation, Augmentation::default());
        assert!(cfg.lr_decay_epochs.is_empty());
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn test_train_flags() {
        let cfg = train_config(&[
            "--device", "1",
            "--optimizer", "momentum",
            "--augment", "crop",
            "--lr-decay-epochs", "50,75",
            "--seed", "7",
        ]);
        assert_eq!(cfg.device_id, 1);
        assert_eq!(cfg.optimizer, OptimizerKind::Momentum);
        assert_eq!(cfg.augmentation, Augmentation::CenterCrop { margin: 2 });
        assert_eq!(cfg.lr_decay_epochs, vec![50, 75]);
        assert_eq!(cfg.seed, Some(7));
    }

    #[test]
    fn test_negative_device_parses() {
        assert_eq!(train_config(&["--device", "-1"]).device_id, -1);
    }

    #[test]
    fn test_evaluate_overrides_default_to_none() {
        match Cli::parse_from(["cifar-trainer", "evaluate"]).command {
            Commands::Evaluate(a) => {
                assert_eq!(a.checkpoint_dir, "checkpoints");
                assert!(a.device.is_none() && a.batch_size.is_none());
            }
            other => panic!("expected evaluate, got {other:?}"),
        }
    }
}
