// ============================================================
// Layer 6 — Metrics
// ============================================================
// Two concerns live here:
//
//   ErrorRates     corpus-level character and word error rates of
//                  greedy translations against their references
//                  (Levenshtein edits / reference length)
//
//   MetricsLogger  appends one CSV row per epoch to
//                  {checkpoint_dir}/metrics.csv
//
// Example CSV output:
//   epoch,global_step,train_loss,val_cer,val_wer
//   1,1126,6.213400,0.712000,0.934000
//   2,2252,5.104200,0.655000,0.881000
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

use crate::infra::tokenizer_store::pre_tokenize;

/// Minimum number of single-element insertions, deletions and
/// substitutions turning `a` into `b`.
pub fn edit_distance<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, x) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, y) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(x != y);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Running totals for CER / WER over many (prediction, reference) pairs.
#[derive(Debug, Default, Clone)]
pub struct ErrorRates {
    char_edits: usize,
    char_total: usize,
    word_edits: usize,
    word_total: usize,
}

impl ErrorRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, predicted: &str, reference: &str) -> Result<()> {
        let p: Vec<char> = predicted.chars().collect();
        let r: Vec<char> = reference.chars().collect();
        self.char_edits += edit_distance(&p, &r);
        self.char_total += r.len();

        let p = pre_tokenize(predicted)?;
        let r = pre_tokenize(reference)?;
        self.word_edits += edit_distance(&p, &r);
        self.word_total += r.len();
        Ok(())
    }

    /// Character error rate; 0.0 before any reference text was seen
    pub fn cer(&self) -> f64 {
        ratio(self.char_edits, self.char_total)
    }

    /// Word error rate; 0.0 before any reference text was seen
    pub fn wer(&self) -> f64 {
        ratio(self.word_edits, self.word_total)
    }
}

fn ratio(edits: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { edits as f64 / total as f64 }
}

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:       usize,
    pub global_step: usize,

    /// Mean label-smoothed cross-entropy over the epoch's batches
    pub train_loss:  f64,

    pub val_cer:     f64,
    pub val_wer:     f64,
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so a
    /// resumed run keeps appending to the same log.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "epoch,global_step,train_loss,val_cer,val_wer")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new().append(true).open(&self.csv_path)?;

        writeln!(
            f,
            "{},{},{:.6},{:.6},{:.6}",
            m.epoch, m.global_step, m.train_loss, m.val_cer, m.val_wer,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, cer={:.4}, wer={:.4}",
            m.epoch, m.train_loss, m.val_cer, m.val_wer,
        );
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_distance() {
        let k: Vec<char> = "kitten".chars().collect();
        let s: Vec<char> = "sitting".chars().collect();
        assert_eq!(edit_distance(&k, &s), 3);
        assert_eq!(edit_distance::<char>(&[], &s), 7);
        assert_eq!(edit_distance(&k, &k), 0);
    }

    #[test]
    fn test_error_rates() {
        let mut rates = ErrorRates::new();
        assert_eq!(rates.cer(), 0.0);

        rates.update("il gatto dorme", "il gatto dorme").unwrap();
        assert_eq!(rates.cer(), 0.0);
        assert_eq!(rates.wer(), 0.0);

        // One substituted word out of three more
        rates.update("il cane dorme", "il gatto dorme").unwrap();
        assert!((rates.wer() - 1.0 / 6.0).abs() < 1e-9);
        assert!(rates.cer() > 0.0);
    }

    #[test]
    fn test_word_error_rate_splits_like_the_tokenizer() {
        // "città." is two words ("città", "."); only the punctuation differs
        let mut rates = ErrorRates::new();
        rates.update("la città!", "la città.").unwrap();
        assert!((rates.wer() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_logger_appends_rows() {
        let dir = std::env::temp_dir().join(format!("tt-metrics-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);

        let logger = MetricsLogger::new(&dir).unwrap();
        let row = EpochMetrics { epoch: 1, global_step: 10, train_loss: 2.5, val_cer: 0.4, val_wer: 0.6 };
        logger.log(&row).unwrap();
        logger.log(&EpochMetrics { epoch: 2, ..row }).unwrap();

        let text = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "epoch,global_step,train_loss,val_cer,val_wer");
        assert_eq!(lines[1], "1,10,2.500000,0.400000,0.600000");
        assert!(lines[2].starts_with("2,"));

        let _ = fs::remove_dir_all(&dir);
    }
}
