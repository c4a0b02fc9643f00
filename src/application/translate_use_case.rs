// ============================================================
// Layer 2 — Translate Use Case
// ============================================================
// Loads the latest checkpoint once, then translates sentences
// one at a time with greedy decoding.

use anyhow::Result;

use crate::domain::traits::Translator;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::translator::ModelTranslator;

pub struct TranslateUseCase {
    translator: Box<dyn Translator>,
}

impl TranslateUseCase {
    pub fn new(checkpoint_dir: &str) -> Result<Self> {
        let ckpt = CheckpointManager::open(checkpoint_dir)?;
        let translator = ModelTranslator::from_checkpoint(&ckpt)?;
        Ok(Self::with_translator(Box::new(translator)))
    }

    pub fn with_translator(translator: Box<dyn Translator>) -> Self {
        Self { translator }
    }

    pub fn translate(&self, sentence: &str) -> Result<String> {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            return Ok(String::new());
        }
        self.translator.translate(sentence)
    }
}
