// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits so the
// concrete corpus format and the concrete model can be swapped:
//
//   - JsonlCorpus implements CorpusSource
//   - ModelTranslator implements Translator
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::translation_pair::TranslationPair;

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Any component that can produce aligned sentence pairs.
pub trait CorpusSource {
    /// Load every pair available from this source.
    fn load_all(&self) -> Result<Vec<TranslationPair>>;
}

// ─── Translator ───────────────────────────────────────────────────────────────
/// Any component that can translate one sentence.
pub trait Translator {
    fn translate(&self, sentence: &str) -> Result<String>;
}
