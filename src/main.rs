#![recursion_limit = "256"]

mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;

use anyhow::Result;
use cli::Cli;
use clap::Parser;

fn main() -> Result<()> {
    // RUST_LOG wins; otherwise this crate logs at INFO
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive("cifar_trainer=info".parse()?)
                .from_env_lossy(),
        )
        .init();

    let cli = Cli::parse();
    cli.run()
}
