// ============================================================
// Layer 3 — TranslationPair Domain Type
// ============================================================
// One aligned sentence pair from a parallel corpus.
//
// Example (en → it):
//   source: "The cat sleeps."
//   target: "Il gatto dorme."

use serde::{Deserialize, Serialize};

/// An aligned (source, target) sentence pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationPair {
    /// Sentence in the source language
    pub source: String,

    /// Reference translation in the target language
    pub target: String,
}

impl TranslationPair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Text for the requested side of the pair
    pub fn side(&self, side: Side) -> &str {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }
}

/// Which half of a pair a tokenizer or vocabulary belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Target,
}
