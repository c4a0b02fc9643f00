// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the parallel corpus       (Layer 4 - data)
//   Step 2: Build / load both tokenizers   (Layer 6 - infra)
//   Step 3: Frame every pair as a sample   (Layer 4 - data)
//   Step 4: Split train/validation         (Layer 4 - data)
//   Step 5: Save config                    (Layer 6 - infra)
//   Step 6: Run training loop              (Layer 5 - ml)
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::{encode_ids, TranslationDataset},
    loader::JsonlCorpus,
    splitter::split_train_val,
};
use crate::domain::traits::CorpusSource;
use crate::domain::translation_pair::{Side, TranslationPair};
use crate::infra::{
    checkpoint::{CheckpointManager, TrainingState},
    metrics::MetricsLogger,
    tokenizer_store::{special_tokens, TokenizerStore},
};
use crate::ml::model::TransformerConfig;
use crate::ml::trainer::{run_training, TrainingData};

/// Share of the corpus used for training; the rest is validation.
pub const TRAIN_FRACTION: f64 = 0.9;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Serialisable so it can be saved to disk and reloaded for inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus_path:    String,
    pub checkpoint_dir: String,
    pub lang_src:       String,
    pub lang_tgt:       String,
    pub seq_len:        usize,
    pub batch_size:     usize,
    pub epochs:         usize,
    pub lr:             f64,
    pub d_model:        usize,
    pub num_layers:     usize,
    pub num_heads:      usize,
    pub d_ff:           usize,
    pub dropout:        f64,
    /// "latest", an epoch number, or None to start fresh
    pub preload:        Option<String>,
    pub seed:           u64,
    /// How many validation sentences are decoded each epoch
    pub val_examples:   usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_path:    "data/opus_books_en_it.jsonl".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            lang_src:       "en".to_string(),
            lang_tgt:       "it".to_string(),
            seq_len:        350,
            batch_size:     8,
            epochs:         20,
            lr:             1e-4,
            d_model:        512,
            num_layers:     6,
            num_heads:      8,
            d_ff:           2048,
            dropout:        0.1,
            preload:        None,
            seed:           42,
            val_examples:   2,
        }
    }
}

impl TrainConfig {
    /// Architecture for the given vocabulary sizes. Both sides share seq_len.
    pub fn model_config(&self, src_vocab_size: usize, tgt_vocab_size: usize) -> TransformerConfig {
        TransformerConfig::new(src_vocab_size, tgt_vocab_size, self.seq_len, self.seq_len)
            .with_d_model(self.d_model)
            .with_num_layers(self.num_layers)
            .with_num_heads(self.num_heads)
            .with_d_ff(self.d_ff)
            .with_dropout(self.dropout)
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainingState> {
        let cfg = &self.config;

        // ── Step 1: Load the corpus ───────────────────────────────────────────
        tracing::info!("Loading corpus from '{}'", cfg.corpus_path);
        let corpus = JsonlCorpus::new(&cfg.corpus_path, &cfg.lang_src, &cfg.lang_tgt);
        let pairs  = corpus.load_all()?;
        if pairs.is_empty() {
            bail!("No {}→{} pairs found in '{}'", cfg.lang_src, cfg.lang_tgt, cfg.corpus_path);
        }
        tracing::info!("Loaded {} sentence pairs", pairs.len());

        // ── Step 2: Tokenizers, one per language ──────────────────────────────
        let tok_store     = TokenizerStore::new(&cfg.checkpoint_dir);
        let src_tokenizer = tok_store.load_or_build(&cfg.lang_src, &side_texts(&pairs, Side::Source))?;
        let tgt_tokenizer = tok_store.load_or_build(&cfg.lang_tgt, &side_texts(&pairs, Side::Target))?;

        let tokens = special_tokens(&src_tokenizer)?;
        if special_tokens(&tgt_tokenizer)? != tokens {
            bail!("Source and target tokenizers disagree on special token ids");
        }

        log_max_lengths(&pairs, &src_tokenizer, &tgt_tokenizer)?;

        // ── Step 3: Frame pairs into samples ──────────────────────────────────
        let dataset = TranslationDataset::from_pairs(
            &pairs, &src_tokenizer, &tgt_tokenizer, tokens, cfg.seq_len,
        )?;
        if dataset.samples().is_empty() {
            bail!("No pair fits seq_len={}; increase --seq-len", cfg.seq_len);
        }

        // ── Step 4: Train / validation split ──────────────────────────────────
        let (train, val) = split_train_val(dataset.into_samples(), TRAIN_FRACTION, cfg.seed);
        tracing::info!("Split: {} train, {} validation", train.len(), val.len());

        // ── Step 5: Save config for inference ─────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.checkpoint_dir)?;
        ckpt_manager.save_config(cfg)?;
        let metrics = MetricsLogger::new(&cfg.checkpoint_dir)?;

        // ── Step 6: Run training loop (Layer 5) ───────────────────────────────
        let data = TrainingData {
            train:          TranslationDataset::new(train),
            val,
            src_vocab_size: src_tokenizer.get_vocab_size(true),
            tgt_vocab_size: tgt_tokenizer.get_vocab_size(true),
            tokens,
            tgt_tokenizer,
        };
        run_training(cfg, data, ckpt_manager, metrics)
    }
}

fn side_texts(pairs: &[TranslationPair], side: Side) -> Vec<&str> {
    pairs.iter().map(|p| p.side(side)).collect()
}

fn log_max_lengths(
    pairs:         &[TranslationPair],
    src_tokenizer: &tokenizers::Tokenizer,
    tgt_tokenizer: &tokenizers::Tokenizer,
) -> Result<()> {
    let mut max_src = 0;
    let mut max_tgt = 0;
    for pair in pairs {
        max_src = max_src.max(encode_ids(src_tokenizer, &pair.source)?.len());
        max_tgt = max_tgt.max(encode_ids(tgt_tokenizer, &pair.target)?.len());
    }
    tracing::info!("Max length of source sentence: {}", max_src);
    tracing::info!("Max length of target sentence: {}", max_tgt);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = TrainConfig::default();
        assert_eq!(cfg.lang_src, "en");
        assert_eq!(cfg.lang_tgt, "it");
        assert_eq!(cfg.seq_len, 350);
        assert!(cfg.preload.is_none());
    }

    #[test]
    fn test_model_config_carries_hyperparameters() {
        let cfg = TrainConfig { d_model: 64, num_heads: 4, seq_len: 20, ..TrainConfig::default() };
        let model_cfg = cfg.model_config(100, 120);
        assert_eq!(model_cfg.src_vocab_size, 100);
        assert_eq!(model_cfg.tgt_vocab_size, 120);
        assert_eq!(model_cfg.src_seq_len, 20);
        assert_eq!(model_cfg.tgt_seq_len, 20);
        assert_eq!(model_cfg.d_model, 64);
        assert_eq!(model_cfg.num_heads, 4);
    }

    #[test]
    fn test_missing_corpus_fails() {
        let cfg = TrainConfig {
            corpus_path: "/nonexistent/corpus.jsonl".to_string(),
            ..TrainConfig::default()
        };
        assert!(TrainUseCase::new(cfg).execute().is_err());
    }
}
