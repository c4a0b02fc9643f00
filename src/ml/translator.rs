// ============================================================
// Layer 5 — Translator
// ============================================================
// Loads the latest checkpoint and greedily translates single
// sentences.
use anyhow::Result;
use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::data::dataset::{encode_ids, frame_source};
use crate::domain::tokens::SpecialTokens;
use crate::domain::traits::Translator;
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{special_tokens, TokenizerStore},
};
use crate::ml::{
    decode::{greedy_decode, ids_tensor},
    mask::encoder_mask_tensor,
    model::Transformer,
};

type InferBackend = burn::backend::Wgpu;

pub struct ModelTranslator<B: Backend = InferBackend> {
    model:         Transformer<B>,
    src_tokenizer: Tokenizer,
    tgt_tokenizer: Tokenizer,
    src_tokens:    SpecialTokens,
    tgt_tokens:    SpecialTokens,
    seq_len:       usize,
    device:        B::Device,
}

impl ModelTranslator<InferBackend> {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager) -> Result<Self> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        let cfg    = ckpt_manager.load_config()?;

        let store         = TokenizerStore::new(ckpt_manager.dir());
        let src_tokenizer = store.load(&cfg.lang_src)?;
        let tgt_tokenizer = store.load(&cfg.lang_tgt)?;

        let model_cfg = cfg
            .model_config(src_tokenizer.get_vocab_size(true), tgt_tokenizer.get_vocab_size(true))
            .with_dropout(0.0);
        let model: Transformer<InferBackend> = model_cfg.init(&device)?;
        let model = ckpt_manager.load_latest_model(model, &device)?;
        tracing::info!("Model loaded from checkpoint");

        Self::new(model, src_tokenizer, tgt_tokenizer, cfg.seq_len, device)
    }
}

impl<B: Backend> ModelTranslator<B> {
    pub fn new(
        model:         Transformer<B>,
        src_tokenizer: Tokenizer,
        tgt_tokenizer: Tokenizer,
        seq_len:       usize,
        device:        B::Device,
    ) -> Result<Self> {
        Ok(Self {
            src_tokens: special_tokens(&src_tokenizer)?,
            tgt_tokens: special_tokens(&tgt_tokenizer)?,
            model,
            src_tokenizer,
            tgt_tokenizer,
            seq_len,
            device,
        })
    }

    /// Greedy output ids for one sentence, including [SOS] and [EOS].
    pub fn translate_ids(&self, sentence: &str) -> Result<Vec<u32>> {
        let src_ids = encode_ids(&self.src_tokenizer, sentence)?;
        let encoder_input = frame_source(&src_ids, self.src_tokens, self.seq_len)?;

        let source = ids_tensor::<B>(&encoder_input, &self.device);
        let mask   = encoder_mask_tensor(&[encoder_input], self.src_tokens.pad, &self.device);

        Ok(greedy_decode(
            &self.model,
            source,
            mask,
            self.tgt_tokens.sos,
            self.tgt_tokens.eos,
            self.seq_len,
            &self.device,
        ))
    }
}

impl<B: Backend> Translator for ModelTranslator<B> {
    fn translate(&self, sentence: &str) -> Result<String> {
        let ids = self.translate_ids(sentence)?;
        let text = self
            .tgt_tokenizer
            .decode(&ids, true)
            .map_err(|e| anyhow::anyhow!("Decode: {e}"))?;
        tracing::debug!("'{}' → {:?}", sentence, ids);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::TransformerConfig;

    type TestBackend = burn::backend::NdArray;

    fn store() -> (TokenizerStore, std::path::PathBuf) {
        let dir = std::env::temp_dir().join(format!("tt-translator-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        (TokenizerStore::new(&dir), dir)
    }

    #[test]
    fn test_untrained_model_produces_bounded_output() {
        let (store, dir) = store();
        let src = store.load_or_build("en", &["the cat", "the cat"]).unwrap();
        let tgt = store.load_or_build("it", &["il gatto", "il gatto"]).unwrap();
        let device = Default::default();

        let model = TransformerConfig::new(src.get_vocab_size(true), tgt.get_vocab_size(true), 8, 8)
            .with_d_model(8)
            .with_num_layers(1)
            .with_num_heads(2)
            .with_d_ff(16)
            .init::<TestBackend>(&device)
            .unwrap();
        let translator = ModelTranslator::new(model, src, tgt, 8, device).unwrap();

        let ids = translator.translate_ids("the cat").unwrap();
        assert_eq!(ids[0], SpecialTokens::default().sos);
        assert!(ids.len() <= 8);
        assert!(translator.translate("the cat").is_ok());

        // 7 source tokens + [SOS] + [EOS] > 8
        assert!(translator.translate("the the the the the the the").is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
