// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per epoch so learning curves can be
// plotted after (or during) a run.
//
// Columns:
//   epoch       1-based epoch number
//   train_loss  weighted mean loss over the training set
//   train_acc   weighted mean accuracy over the training set
//   valid_loss  … validation set (empty when not run)
//   valid_acc
//   test_loss   … test set (empty when not run)
//   test_acc
//   test_secs   wall-clock seconds of the test pass
//
// Example:
//   epoch,train_loss,train_acc,valid_loss,valid_acc,test_loss,test_acc,test_secs
//   1,1.812345,0.334000,,,1.601234,0.412300,2.104
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::domain::metrics::{EpochStats, Metrics};

const HEADER: &str = "epoch,train_loss,train_acc,valid_loss,valid_acc,test_loss,test_acc,test_secs";

/// Logs epoch statistics to `<dir>/metrics.csv`.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the logger, writing the header if the file is new.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let csv_path = dir.join("metrics.csv");

        // Appending to an existing log keeps earlier runs
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's statistics.
    pub fn log(&self, stats: &EpochStats) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{}", format_row(stats))?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}",
            stats.epoch + 1,
            stats.train.loss,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

fn format_row(stats: &EpochStats) -> String {
    let pair = |m: Option<Metrics>| match m {
        Some(m) => format!("{:.6},{:.6}", m.loss, m.accuracy),
        None    => ",".to_string(),
    };
    let secs = stats
        .test_elapsed
        .map(|d| format!("{:.3}", d.as_secs_f64()))
        .unwrap_or_default();

    format!(
        "{},{},{},{},{}",
        stats.epoch + 1,
        pair(Some(stats.train)),
        pair(stats.valid),
        pair(stats.test),
        secs,
    )
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn stats(valid: Option<Metrics>, test: Option<Metrics>) -> EpochStats {
        EpochStats {
            epoch: 0,
            train: Metrics::new(1.5, 0.25),
            valid,
            test,
            test_elapsed: test.map(|_| Duration::from_millis(1500)),
        }
    }

    #[test]
    fn test_row_with_all_phases() {
        let row = format_row(&stats(Some(Metrics::new(1.0, 0.5)), Some(Metrics::new(2.0, 0.75))));
        assert_eq!(row, "1,1.500000,0.250000,1.000000,0.500000,2.000000,0.750000,1.500");
    }

    #[test]
    fn test_missing_phases_leave_empty_cells() {
        let row = format_row(&stats(None, None));
        assert_eq!(row, "1,1.500000,0.250000,,,,,");
        assert_eq!(row.split(',').count(), HEADER.split(',').count());
    }

    #[test]
    fn test_log_appends_after_header() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = MetricsLogger::new(dir.path()).unwrap();
        logger.log(&stats(None, None)).unwrap();
        logger.log(&stats(None, None)).unwrap();

        let text  = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
    }
}
