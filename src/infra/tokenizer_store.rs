// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// One word-level tokenizer per language, persisted as
// {dir}/tokenizer_{lang}.json in HuggingFace format.
//
// The vocabulary JSON is written directly and loaded back through
// tokenizers::Tokenizer::from_file, which sidesteps the trainer
// ModelWrapper type mismatch in tokenizers 0.15.
//
// Vocabulary layout:
//   [UNK]=0 [PAD]=1 [SOS]=2 [EOS]=3, then every word seen at least
//   MIN_FREQUENCY times, most frequent first (ties alphabetical).
//
// Reference: HuggingFace tokenizers — WordLevel model

use anyhow::{Context, Result};
use std::{collections::HashMap, path::PathBuf};
use tokenizers::{
    pre_tokenizers::whitespace::Whitespace, OffsetReferential, OffsetType, PreTokenizedString,
    PreTokenizer, Tokenizer,
};

use crate::domain::tokens::{SpecialTokens, EOS_TOKEN, PAD_TOKEN, SOS_TOKEN, SPECIAL_TOKENS, UNK_TOKEN};

/// Words rarer than this map to [UNK].
pub const MIN_FREQUENCY: usize = 2;

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, lang: &str) -> PathBuf {
        self.dir.join(format!("tokenizer_{lang}.json"))
    }

    /// Load the tokenizer for `lang`, or build it from `texts` if none exists.
    pub fn load_or_build<S: AsRef<str>>(&self, lang: &str, texts: &[S]) -> Result<Tokenizer> {
        if self.path_for(lang).exists() {
            tracing::info!("Loading existing '{}' tokenizer from disk", lang);
            self.load(lang)
        } else {
            tracing::info!("Building new '{}' tokenizer from {} sentences", lang, texts.len());
            self.build_and_save(lang, texts)
        }
    }

    pub fn load(&self, lang: &str) -> Result<Tokenizer> {
        let path = self.path_for(lang);
        Tokenizer::from_file(&path).map_err(|e| {
            anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e)
        })
    }

    fn build_and_save<S: AsRef<str>>(&self, lang: &str, texts: &[S]) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let vocab = build_vocab(texts.iter().map(|t| t.as_ref()), MIN_FREQUENCY)?;
        let vocab_size = vocab.len();

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .enumerate()
            .map(|(id, content)| serde_json::json!({
                "id": id, "content": content,
                "single_word": false, "lstrip": false, "rstrip": false,
                "normalized": false, "special": true
            }))
            .collect();

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": null,
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let path = self.path_for(lang);
        std::fs::write(&path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write tokenizer JSON '{}'", path.display()))?;

        tracing::info!(
            "Tokenizer '{}' built with {} entries, saved to '{}'",
            lang,
            vocab_size,
            path.display()
        );

        Tokenizer::from_file(&path).map_err(|e| anyhow::anyhow!("Cannot reload tokenizer: {e}"))
    }
}

/// Resolve the reserved ids from a loaded tokenizer.
pub fn special_tokens(tokenizer: &Tokenizer) -> Result<SpecialTokens> {
    let id = |token: &str| {
        tokenizer
            .token_to_id(token)
            .with_context(|| format!("Tokenizer has no '{token}' entry"))
    };
    Ok(SpecialTokens {
        unk: id(UNK_TOKEN)?,
        pad: id(PAD_TOKEN)?,
        sos: id(SOS_TOKEN)?,
        eos: id(EOS_TOKEN)?,
    })
}

/// Split `text` with the same `Whitespace` pre-tokenizer the saved
/// tokenizer uses, so vocabulary keys and encoded pieces always agree.
pub fn pre_tokenize(text: &str) -> Result<Vec<String>> {
    let mut pretokenized = PreTokenizedString::from(text);
    Whitespace {}
        .pre_tokenize(&mut pretokenized)
        .map_err(|e| anyhow::anyhow!("Pre-tokenisation error: {e}"))?;

    Ok(pretokenized
        .get_splits(OffsetReferential::Original, OffsetType::Byte)
        .into_iter()
        .map(|(piece, _, _)| piece.to_string())
        .collect())
}

/// Word → id map with the special tokens first.
pub fn build_vocab<'a>(
    texts:         impl IntoIterator<Item = &'a str>,
    min_frequency: usize,
) -> Result<HashMap<String, u32>> {
    let mut freq: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for word in pre_tokenize(text)? {
            *freq.entry(word).or_insert(0) += 1;
        }
    }

    let mut words: Vec<(String, usize)> = freq
        .into_iter()
        .filter(|(w, n)| *n >= min_frequency && !SPECIAL_TOKENS.contains(&w.as_str()))
        .collect();
    words.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut vocab: HashMap<String, u32> = SPECIAL_TOKENS
        .iter()
        .enumerate()
        .map(|(id, t)| (t.to_string(), id as u32))
        .collect();
    for (word, _) in words {
        let next = vocab.len() as u32;
        vocab.insert(word, next);
    }
    Ok(vocab)
}
