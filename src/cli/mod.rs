// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
// Two commands are supported:
//   1. `train`    — trains the CNN on CIFAR-10 and writes
//                   checkpoints plus metrics.csv
//   2. `evaluate` — loads the latest checkpoint and scores it
//                   on the test batch
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "cifar-trainer",
    version = "0.1.0",
    about = "Train a CNN on CIFAR-10 with augmentation, then evaluate checkpoints."
)]
pub struct Cli {
    /// The subcommand to run (train or evaluate)
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the matching use case. The CLI only routes, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on CIFAR-10 in: {}", args.data_dir);
    let checkpoint_dir = args.checkpoint_dir.clone();

    let history = TrainUseCase::new(args.into()).execute()?;

    match history.last() {
        Some(last) => {
            println!("Training complete after {} epochs.", history.len());
            println!(
                "Final train loss {:.4}, accuracy {:.2}%",
                last.train.loss,
                last.train.accuracy * 100.0
            );
            if let Some(test) = last.test {
                println!("Final test  loss {:.4}, accuracy {:.2}%", test.loss, test.accuracy * 100.0);
            }
        }
        None => println!("No epochs were run."),
    }
    println!("Checkpoints and metrics.csv are in '{}'.", checkpoint_dir);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let metrics = EvaluateUseCase::new(args.checkpoint_dir)
        .with_data_dir(args.data_dir)
        .with_device(args.device)
        .with_batch_size(args.batch_size)
        .with_limit(args.limit)
        .execute()?;

    println!("\nTest loss:     {:.4}", metrics.loss);
    println!("Test accuracy: {:.2}%", metrics.accuracy * 100.0);
    Ok(())
}
