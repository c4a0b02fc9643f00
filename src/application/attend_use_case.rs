// ============================================================
// Layer 2 — Attend Use Case
// ============================================================
// Shows raw scaled dot-product attention on pretrained word
// vectors: every word of a sentence is query, key and value at
// once, and the resulting weight matrix is returned row by row.

use anyhow::{bail, Result};

use crate::infra::word_vectors::WordVectors;
use crate::ml::attention::raw_self_attention;

/// Attention weights between the words of one sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct AttentionMatrix {
    pub words:   Vec<String>,
    /// `weights[i][j]` is how much word i attends to word j
    pub weights: Vec<Vec<f32>>,
}

impl AttentionMatrix {
    /// Plain-text table with one row per query word.
    pub fn render(&self) -> String {
        let width = self.words.iter().map(String::len).max().unwrap_or(0).max(6);
        let mut out = format!("{:width$}", "");
        for w in &self.words {
            out.push_str(&format!(" {:>width$}", w));
        }
        out.push('\n');
        for (w, row) in self.words.iter().zip(&self.weights) {
            out.push_str(&format!("{:width$}", w));
            for v in row {
                out.push_str(&format!(" {:>width$.3}", v));
            }
            out.push('\n');
        }
        out
    }
}

pub struct AttendUseCase {
    vectors: WordVectors,
}

impl AttendUseCase {
    pub fn new(vectors_path: &str) -> Result<Self> {
        Ok(Self::with_vectors(WordVectors::load(vectors_path)?))
    }

    pub fn with_vectors(vectors: WordVectors) -> Self {
        Self { vectors }
    }

    pub fn attend(&self, sentence: &str) -> Result<AttentionMatrix> {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        let (found, matrix) = self.vectors.lookup(&words);
        if found.is_empty() {
            bail!("None of the words in '{}' have a vector", sentence);
        }

        let n = found.len();
        let flat = raw_self_attention(matrix, n, self.vectors.dim())?;

        Ok(AttentionMatrix {
            words:   found.iter().map(|w| w.to_string()).collect(),
            weights: flat.chunks(n).map(<[f32]>::to_vec).collect(),
        })
    }
}
