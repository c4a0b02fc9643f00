// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Reads a parallel corpus stored as JSON Lines, one record per
// line, in the opus_books record shape:
//
//   {"id": "0", "translation": {"en": "Source text", "it": "Testo"}}
//
// Only the two requested language keys are read; anything else
// on the record is ignored. Blank lines are skipped, and a record
// missing either language is skipped with a warning.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::HashMap, fs, path::PathBuf};

use crate::domain::traits::CorpusSource;
use crate::domain::translation_pair::TranslationPair;

#[derive(Debug, Deserialize)]
struct CorpusRecord {
    translation: HashMap<String, String>,
}

/// A JSONL parallel corpus on local disk.
pub struct JsonlCorpus {
    path:     PathBuf,
    lang_src: String,
    lang_tgt: String,
}

impl JsonlCorpus {
    pub fn new(
        path:     impl Into<PathBuf>,
        lang_src: impl Into<String>,
        lang_tgt: impl Into<String>,
    ) -> Self {
        Self {
            path:     path.into(),
            lang_src: lang_src.into(),
            lang_tgt: lang_tgt.into(),
        }
    }

    /// Parse corpus text already held in memory.
    pub fn parse(&self, text: &str) -> Result<Vec<TranslationPair>> {
        let mut pairs = Vec::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let record: CorpusRecord = serde_json::from_str(line).with_context(|| {
                format!("Invalid JSON on line {} of '{}'", line_no + 1, self.path.display())
            })?;

            match (
                record.translation.get(&self.lang_src),
                record.translation.get(&self.lang_tgt),
            ) {
                (Some(src), Some(tgt)) => pairs.push(TranslationPair::new(src.as_str(), tgt.as_str())),
                _ => tracing::warn!(
                    "Skipping line {}: missing '{}' or '{}'",
                    line_no + 1,
                    self.lang_src,
                    self.lang_tgt
                ),
            }
        }

        Ok(pairs)
    }
}

impl CorpusSource for JsonlCorpus {
    fn load_all(&self) -> Result<Vec<TranslationPair>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read corpus '{}'", self.path.display()))?;
        let pairs = self.parse(&text)?;
        tracing::info!(
            "Loaded {} {}→{} pairs from '{}'",
            pairs.len(),
            self.lang_src,
            self.lang_tgt,
            self.path.display()
        );
        Ok(pairs)
    }
}
